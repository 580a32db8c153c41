//! Backend fed by a continuously published sensor stream.
//!
//! Three feeds are registered on the transport: color, aligned depth, and calibration.
//! Each delivery is normalized, optionally flipped, cropped and then swapped into a
//! shared snapshot together with its delivery time. Readers copy out of that
//! snapshot after the staleness wait.

use crate::backend::{CaptureBackend, DepthCapture, Sealed};
use crate::error::CaptureError;
use crate::staleness::{LivenessState, StalenessTracker};
use crate::transport::{CameraInfo, ChannelOrder, ImageMessage, ImageTransport};
use image::{GrayImage, RgbImage, imageops};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use std::time::Instant;
use tracing::{debug, info, warn};
use viewcap_data::{CropSpec, DEFAULT_DEPTH_ALPHA, RawFrame, apply_bone_colormap, crop, scale_abs};

/// Settings for a stream subscriber.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Base topic; feeds live under `<topic>/color/...` and `<topic>/aligned_depth_to_color/...`.
    pub topic: String,
    pub crop: CropSpec,
    /// Swap BGR color messages to RGB.
    pub normalize_channels: bool,
    /// Rotate every frame by 180 degrees (vertical and horizontal flip).
    pub flip: bool,
    /// Scale applied to depth samples before false-coloring.
    pub depth_alpha: f64,
    pub staleness: StalenessTracker,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            topic: "camera".to_string(),
            crop: CropSpec::default(),
            normalize_channels: true,
            flip: false,
            depth_alpha: DEFAULT_DEPTH_ALPHA,
            staleness: StalenessTracker::default(),
        }
    }
}

impl StreamConfig {
    pub fn color_topic(&self) -> String {
        format!("{}/color/image_raw", self.topic)
    }

    pub fn depth_topic(&self) -> String {
        format!("{}/aligned_depth_to_color/image_raw", self.topic)
    }

    pub fn info_topic(&self) -> String {
        format!("{}/color/camera_info", self.topic)
    }
}

/// Latest delivered data. Replaced field-by-field under one lock.
#[derive(Debug, Default)]
struct Snapshot {
    rgb: Option<Arc<RgbImage>>,
    depth: Option<Arc<GrayImage>>,
    info: Option<CameraInfo>,
    liveness: LivenessState,
}

type SharedSnapshot = Arc<RwLock<Snapshot>>;

/// Push-style backend over an [`ImageTransport`].
pub struct StreamSubscriberBackend {
    config: StreamConfig,
    snapshot: SharedSnapshot,
}

impl StreamSubscriberBackend {
    /// Validate the config and register the color, depth and calibration feeds.
    pub fn new(transport: &dyn ImageTransport, config: StreamConfig) -> Result<Self, CaptureError> {
        config.crop.validate()?;
        let snapshot = SharedSnapshot::default();

        let feed = Arc::new(FeedSettings::from(&config));

        let (state, settings) = (Arc::clone(&snapshot), Arc::clone(&feed));
        transport.subscribe_image(
            &config.color_topic(),
            Box::new(move |message| on_color(&state, &settings, message)),
        )?;

        let (state, settings) = (Arc::clone(&snapshot), Arc::clone(&feed));
        transport.subscribe_image(
            &config.depth_topic(),
            Box::new(move |message| on_depth(&state, &settings, message)),
        )?;

        let state = Arc::clone(&snapshot);
        transport.subscribe_info(
            &config.info_topic(),
            Box::new(move |camera_info| on_info(&state, camera_info)),
        )?;

        info!("Stream subscriber registered on {}", config.topic);
        Ok(Self { config, snapshot })
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Last calibration message, if one has arrived.
    pub fn camera_info(&self) -> Option<CameraInfo> {
        self.read(|snapshot| snapshot.info.clone())
    }

    /// Image width reported by the calibration feed.
    pub fn image_width(&self) -> Option<u32> {
        self.read(|snapshot| snapshot.info.as_ref().map(|info| info.width))
    }

    fn read<T>(&self, f: impl FnOnce(&Snapshot) -> T) -> T {
        match self.snapshot.read() {
            Ok(snapshot) => f(&snapshot),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }

    fn liveness(&self) -> LivenessState {
        self.read(|snapshot| snapshot.liveness)
    }
}

impl Sealed for StreamSubscriberBackend {}

impl CaptureBackend for StreamSubscriberBackend {
    fn is_connected(&self) -> bool {
        self.config.staleness.await_first_update(|| self.liveness())
    }

    fn get_current_rgb_image(&mut self) -> Result<Option<RgbImage>, CaptureError> {
        let call_start = Instant::now();
        let held = self.config.staleness.await_fresh(call_start, || {
            self.read(|snapshot| (snapshot.liveness, snapshot.rgb.clone()))
        });
        Ok(held.map(|frame| frame.as_ref().clone()))
    }
}

impl DepthCapture for StreamSubscriberBackend {
    fn get_current_depth_image(&mut self) -> Result<Option<RawFrame>, CaptureError> {
        let call_start = Instant::now();
        let held = self.config.staleness.await_fresh(call_start, || {
            self.read(|snapshot| (snapshot.liveness, snapshot.depth.clone()))
        });
        Ok(held.map(|scaled| RawFrame::Color(apply_bone_colormap(&scaled))))
    }
}

/// Per-delivery processing settings shared with the callbacks.
#[derive(Debug)]
struct FeedSettings {
    crop: CropSpec,
    normalize_channels: bool,
    flip: bool,
    depth_alpha: f64,
}

impl From<&StreamConfig> for FeedSettings {
    fn from(config: &StreamConfig) -> Self {
        Self {
            crop: config.crop,
            normalize_channels: config.normalize_channels,
            flip: config.flip,
            depth_alpha: config.depth_alpha,
        }
    }
}

fn on_color(snapshot: &SharedSnapshot, settings: &FeedSettings, message: ImageMessage) {
    let ImageMessage::Color { mut image, order } = message else {
        warn!("Depth message on the color feed, dropping");
        return;
    };

    if settings.normalize_channels && order == ChannelOrder::Bgr {
        swap_red_blue(&mut image);
    }
    if settings.flip {
        imageops::rotate180_in_place(&mut image);
    }
    let image = match crop(&image, &settings.crop) {
        Ok(image) => image,
        Err(err) => {
            warn!("Dropping color frame: {}", err);
            return;
        }
    };

    debug!("Color frame {}x{} delivered", image.width(), image.height());
    store(snapshot, |state| state.rgb = Some(Arc::new(image)));
}

fn on_depth(snapshot: &SharedSnapshot, settings: &FeedSettings, message: ImageMessage) {
    let ImageMessage::Depth(depth) = message else {
        warn!("Color message on the depth feed, dropping");
        return;
    };

    let mut scaled = scale_abs(&depth, settings.depth_alpha);
    if settings.flip {
        imageops::rotate180_in_place(&mut scaled);
    }
    let scaled = match crop(&scaled, &settings.crop) {
        Ok(scaled) => scaled,
        Err(err) => {
            warn!("Dropping depth frame: {}", err);
            return;
        }
    };

    debug!("Depth frame {}x{} delivered", scaled.width(), scaled.height());
    store(snapshot, |state| state.depth = Some(Arc::new(scaled)));
}

fn on_info(snapshot: &SharedSnapshot, camera_info: CameraInfo) {
    store(snapshot, |state| state.info = Some(camera_info));
}

// Apply an update and stamp the delivery time in the same critical section.
fn store(snapshot: &SharedSnapshot, update: impl FnOnce(&mut Snapshot)) {
    let mut state = match snapshot.write() {
        Ok(state) => state,
        Err(poisoned) => poisoned.into_inner(),
    };
    update(&mut state);
    state.liveness.record(Instant::now());
}

fn swap_red_blue(image: &mut RgbImage) {
    for pixel in image.pixels_mut() {
        pixel.0.swap(0, 2);
    }
}
