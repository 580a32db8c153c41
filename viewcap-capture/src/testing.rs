//! In-memory device collaborators for unit tests.

use crate::device::{DepthContext, DepthPipeline, DeviceInfo, FrameSet, PipelineConfig};
use crate::error::CaptureError;
use crate::tethered::{CameraFilePath, CameraPort, TetheredDriver, TetheredSession};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

type FrameQueue = Arc<Mutex<VecDeque<FrameSet>>>;

/// Depth runtime with a scripted device list and frame queue.
#[derive(Default)]
pub struct MockDepthContext {
    devices: Mutex<Vec<DeviceInfo>>,
    frames: FrameQueue,
    started: Mutex<Vec<PipelineConfig>>,
    queries: AtomicUsize,
}

impl MockDepthContext {
    pub fn with_devices(serials: &[&str]) -> Self {
        let context = Self::default();
        context.set_devices(serials);
        context
    }

    pub fn set_devices(&self, serials: &[&str]) {
        *self.devices.lock().unwrap() = serials
            .iter()
            .map(|serial| DeviceInfo {
                name: format!("Depth Camera {serial}"),
                serial_number: serial.to_string(),
            })
            .collect();
    }

    pub fn push_frames(&self, frames: FrameSet) {
        self.frames.lock().unwrap().push_back(frames);
    }

    pub fn started(&self) -> Vec<PipelineConfig> {
        self.started.lock().unwrap().clone()
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl DepthContext for MockDepthContext {
    fn query_devices(&self) -> Result<Vec<DeviceInfo>, CaptureError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.devices.lock().unwrap().clone())
    }

    fn start_pipeline(&self, config: &PipelineConfig) -> Result<Box<dyn DepthPipeline>, CaptureError> {
        let known = self
            .devices
            .lock()
            .unwrap()
            .iter()
            .any(|device| device.serial_number == config.serial_number);
        if !known {
            return Err(CaptureError::Connection(format!(
                "no device with serial '{}'",
                config.serial_number
            )));
        }
        self.started.lock().unwrap().push(config.clone());
        Ok(Box::new(MockPipeline {
            frames: Arc::clone(&self.frames),
        }))
    }
}

struct MockPipeline {
    frames: FrameQueue,
}

impl DepthPipeline for MockPipeline {
    fn wait_for_frames(&mut self) -> Result<FrameSet, CaptureError> {
        self.frames
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| CaptureError::Connection("frame queue exhausted".into()))
    }
}

/// Tethered driver whose sessions hand back pre-encoded image files.
#[derive(Default)]
pub struct MockTetheredDriver {
    pub ports: Vec<CameraPort>,
    pub files: Arc<Mutex<VecDeque<Vec<u8>>>>,
    pub opened: Mutex<Vec<String>>,
}

impl MockTetheredDriver {
    pub fn with_cameras(cameras: &[(&str, &str)]) -> Self {
        Self {
            ports: cameras
                .iter()
                .map(|(name, address)| CameraPort {
                    name: name.to_string(),
                    address: address.to_string(),
                })
                .collect(),
            ..Self::default()
        }
    }

    pub fn push_file(&self, bytes: Vec<u8>) {
        self.files.lock().unwrap().push_back(bytes);
    }
}

impl TetheredDriver for MockTetheredDriver {
    fn autodetect(&self) -> Result<Vec<CameraPort>, CaptureError> {
        Ok(self.ports.clone())
    }

    fn open(&self, address: &str) -> Result<Box<dyn TetheredSession>, CaptureError> {
        self.opened.lock().unwrap().push(address.to_string());
        Ok(Box::new(MockSession {
            files: Arc::clone(&self.files),
            captured: 0,
        }))
    }
}

struct MockSession {
    files: Arc<Mutex<VecDeque<Vec<u8>>>>,
    captured: usize,
}

impl TetheredSession for MockSession {
    fn capture(&mut self) -> Result<CameraFilePath, CaptureError> {
        self.captured += 1;
        Ok(CameraFilePath {
            folder: "/store_00010001/DCIM/100CANON".to_string(),
            name: format!("IMG_{:04}.JPG", self.captured),
        })
    }

    fn download(&mut self, _file: &CameraFilePath) -> Result<Vec<u8>, CaptureError> {
        self.files
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| CaptureError::Connection("camera returned no file".into()))
    }
}
