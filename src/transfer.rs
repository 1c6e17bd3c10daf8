//! Transfer latency benchmark.
//!
//! A pass moves the gradient pattern host→device, reads it back
//! device→host (verifying every byte) and copies it device→device. Only the
//! isolated driver call is inside each timed window: pattern generation and
//! staging/peer texture creation always happen before the clock starts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use indicatif::ProgressBar;
use log::debug;

use crate::error::ProbeError;
use crate::pattern::GradientImage;
use crate::stats::{PassTimings, StageAverages, StageTotals};
use crate::traits::{MappedView, TransferDevice};

/// Uploads `image` over the whole source texture.
///
/// Returns the duration of the update call.
pub fn host_to_device<D: TransferDevice>(
    device: &D,
    image: &GradientImage,
) -> Result<Duration, ProbeError> {
    let start = Instant::now();
    device.update_source(image.as_bytes(), image.row_pitch())?;
    let elapsed = start.elapsed();

    debug!(
        "host -> device: {} ({} bytes) in {:?}",
        image.extent(),
        image.as_bytes().len(),
        elapsed
    );
    Ok(elapsed)
}

/// Reads the source texture back through a staging copy and verifies it
/// against `image`.
///
/// Returns the durations of the copy and of the map. Unmapping happens when
/// the mapping drops and is not timed.
///
/// # Errors
///
/// Driver failures, and `ProbeError::ReadbackMismatch` if the mapped data
/// differs from `image`.
pub fn device_to_host<D: TransferDevice>(
    device: &D,
    image: &GradientImage,
) -> Result<(Duration, Duration), ProbeError> {
    let staging = device.create_staging()?;

    let start = Instant::now();
    device.copy(&staging, device.source())?;
    let copy = start.elapsed();

    let start = Instant::now();
    let mapping = device.map_read(&staging)?;
    let map = start.elapsed();

    debug!(
        "device -> host: copy {:?}, map {:?}, row pitch {}",
        copy,
        map,
        mapping.row_pitch()
    );
    image.verify(mapping.bytes(), mapping.row_pitch())?;

    Ok((copy, map))
}

/// Copies the source texture into a freshly created peer texture.
///
/// Returns the duration of the copy call.
pub fn device_to_device<D: TransferDevice>(device: &D) -> Result<Duration, ProbeError> {
    let peer = device.create_peer()?;

    let start = Instant::now();
    device.copy(&peer, device.source())?;
    let elapsed = start.elapsed();

    debug!("device -> device: {:?}", elapsed);
    Ok(elapsed)
}

/// Runs one full pass: upload, verified download, device copy.
pub fn run_pass<D: TransferDevice>(
    device: &D,
    image: &GradientImage,
) -> Result<PassTimings, ProbeError> {
    let host_to_device = host_to_device(device, image)?;
    let (download_copy, download_map) = device_to_host(device, image)?;
    let device_to_device = device_to_device(device)?;

    Ok(PassTimings {
        host_to_device,
        download_copy,
        download_map,
        device_to_device,
    })
}

/// Repeated-pass benchmark context.
///
/// Owns the per-stage totals; they are reset at the start of every
/// [`run`](Self::run), so one context can be reused across adapters.
pub struct BenchRun {
    iterations: u32,
    totals: StageTotals,
}

impl BenchRun {
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations,
            totals: StageTotals::new(),
        }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Totals accumulated by the last run.
    pub fn totals(&self) -> &StageTotals {
        &self.totals
    }

    /// Runs `iterations` passes against `device` and returns the averages.
    ///
    /// Stops early, after the current pass, once `should_stop` is set; the
    /// averages then cover the passes that completed.
    ///
    /// # Errors
    ///
    /// The first failing pass aborts the run. Totals keep the passes that
    /// completed before it.
    pub fn run<D: TransferDevice>(
        &mut self,
        device: &D,
        should_stop: &AtomicBool,
        progress: &ProgressBar,
    ) -> Result<StageAverages, ProbeError> {
        self.totals.reset();
        let image = GradientImage::new(device.extent());

        for iteration in 0..self.iterations {
            if should_stop.load(Ordering::Relaxed) {
                debug!("stopped after {} of {} passes", iteration, self.iterations);
                break;
            }

            let pass = run_pass(device, &image)?;
            self.totals.record(&pass);
            progress.inc(1);
        }

        Ok(self.totals.averages())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Extent, BYTES_PER_PIXEL};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// Texture kept in host memory with a padded row pitch.
    #[derive(Clone)]
    struct HostTexture(Rc<RefCell<Vec<u8>>>);

    struct HostMapping {
        data: Vec<u8>,
        row_pitch: usize,
    }

    impl MappedView for HostMapping {
        fn bytes(&self) -> &[u8] {
            &self.data
        }

        fn row_pitch(&self) -> usize {
            self.row_pitch
        }
    }

    /// In-memory stand-in for a GPU device.
    struct HostDevice {
        extent: Extent,
        row_pitch: usize,
        source: HostTexture,
        corrupt_copies: bool,
        fail_map_after: Option<u32>,
        maps: Cell<u32>,
    }

    impl HostDevice {
        fn new(extent: Extent) -> Self {
            // Round rows up to 256 bytes the way drivers pad staging rows.
            let row_pitch = (extent.row_pitch() as usize).div_ceil(256) * 256;
            Self {
                extent,
                row_pitch,
                source: HostTexture(Rc::new(RefCell::new(vec![
                    0;
                    row_pitch * extent.height as usize
                ]))),
                corrupt_copies: false,
                fail_map_after: None,
                maps: Cell::new(0),
            }
        }

        fn blank(&self) -> HostTexture {
            HostTexture(Rc::new(RefCell::new(vec![
                0;
                self.row_pitch * self.extent.height as usize
            ])))
        }
    }

    impl TransferDevice for HostDevice {
        type Texture = HostTexture;
        type Mapping = HostMapping;

        fn description(&self) -> String {
            format!("host memory {}", self.extent)
        }

        fn extent(&self) -> Extent {
            self.extent
        }

        fn source(&self) -> &HostTexture {
            &self.source
        }

        fn update_source(&self, data: &[u8], row_pitch: u32) -> Result<(), ProbeError> {
            let width = (self.extent.width * BYTES_PER_PIXEL) as usize;
            let mut dst = self.source.0.borrow_mut();
            for row in 0..self.extent.height as usize {
                let src = &data[row * row_pitch as usize..][..width];
                dst[row * self.row_pitch..][..width].copy_from_slice(src);
            }
            Ok(())
        }

        fn create_staging(&self) -> Result<HostTexture, ProbeError> {
            Ok(self.blank())
        }

        fn create_peer(&self) -> Result<HostTexture, ProbeError> {
            Ok(self.blank())
        }

        fn copy(&self, dst: &HostTexture, src: &HostTexture) -> Result<(), ProbeError> {
            let mut out = dst.0.borrow_mut();
            out.copy_from_slice(&src.0.borrow());
            if self.corrupt_copies {
                let last = out.len() / 2;
                out[last] = out[last].wrapping_add(1);
            }
            Ok(())
        }

        fn map_read(&self, staging: &HostTexture) -> Result<HostMapping, ProbeError> {
            let maps = self.maps.get();
            self.maps.set(maps + 1);
            if self.fail_map_after.is_some_and(|limit| maps >= limit) {
                return Err(ProbeError::Driver {
                    call: "Map",
                    code: 0x887A0005u32 as i32,
                    message: "device removed".to_string(),
                    line: line!(),
                });
            }
            Ok(HostMapping {
                data: staging.0.borrow().clone(),
                row_pitch: self.row_pitch,
            })
        }
    }

    #[test]
    fn test_round_trip_verifies() {
        for extent in [Extent::new(1, 1), Extent::new(33, 7), Extent::new(320, 200)] {
            let device = HostDevice::new(extent);
            let image = GradientImage::new(extent);
            host_to_device(&device, &image).unwrap();
            device_to_host(&device, &image).unwrap();
        }
    }

    #[test]
    fn test_download_detects_corruption() {
        let extent = Extent::new(64, 8);
        let mut device = HostDevice::new(extent);
        device.corrupt_copies = true;
        let image = GradientImage::new(extent);

        host_to_device(&device, &image).unwrap();
        let err = device_to_host(&device, &image).unwrap_err();
        assert!(matches!(err, ProbeError::ReadbackMismatch(_)));
    }

    #[test]
    fn test_download_without_upload_fails() {
        let extent = Extent::new(16, 16);
        let device = HostDevice::new(extent);
        let image = GradientImage::new(extent);

        // Source is still zeroed; byte (0, 1) should be 1.
        match device_to_host(&device, &image) {
            Err(ProbeError::ReadbackMismatch(m)) => {
                assert_eq!((m.row, m.col), (0, 1));
                assert_eq!(m.actual, Some(0));
            }
            other => panic!("expected mismatch, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_device_to_device_copies_source() {
        let extent = Extent::new(8, 8);
        let device = HostDevice::new(extent);
        let image = GradientImage::new(extent);
        host_to_device(&device, &image).unwrap();

        let peer = device.create_peer().unwrap();
        device.copy(&peer, device.source()).unwrap();
        assert_eq!(*peer.0.borrow(), *device.source().0.borrow());

        device_to_device(&device).unwrap();
    }

    #[test]
    fn test_run_pass_timings() {
        let extent = Extent::new(128, 64);
        let device = HostDevice::new(extent);
        let image = GradientImage::new(extent);
        let pass = run_pass(&device, &image).unwrap();
        assert_eq!(pass.download_total(), pass.download_copy + pass.download_map);
    }

    #[test]
    fn test_bench_runs_requested_iterations() {
        let extent = Extent::new(64, 32);
        let device = HostDevice::new(extent);
        let mut bench = BenchRun::new(10);
        let stop = AtomicBool::new(false);

        let averages = bench.run(&device, &stop, &ProgressBar::hidden()).unwrap();
        assert_eq!(averages.passes, 10);
        assert_eq!(bench.totals().passes(), 10);
        assert_eq!(device.maps.get(), 10);

        let lines = averages.lines();
        assert_eq!(lines.len(), 5);
        for (label, ms) in lines {
            assert!(ms >= 0.0, "{label} negative");
        }
    }

    #[test]
    fn test_bench_average_is_total_over_iterations() {
        let device = HostDevice::new(Extent::new(256, 256));
        let mut bench = BenchRun::new(7);
        let stop = AtomicBool::new(false);

        let averages = bench.run(&device, &stop, &ProgressBar::hidden()).unwrap();
        let totals = bench.totals();
        let expect = |us: u64| us as f64 / 7.0 / 1000.0;
        assert_eq!(averages.host_to_device_ms, expect(totals.host_to_device_us()));
        assert_eq!(averages.download_total_ms, expect(totals.download_total_us()));
        assert_eq!(averages.download_copy_ms, expect(totals.download_copy_us()));
        assert_eq!(averages.download_map_ms, expect(totals.download_map_us()));
        assert_eq!(averages.device_to_device_ms, expect(totals.device_to_device_us()));
    }

    #[test]
    fn test_bench_resets_between_devices() {
        let mut bench = BenchRun::new(3);
        let stop = AtomicBool::new(false);
        let progress = ProgressBar::hidden();

        let mut failing = HostDevice::new(Extent::new(16, 16));
        failing.fail_map_after = Some(2);
        let err = bench.run(&failing, &stop, &progress).unwrap_err();
        assert!(matches!(err, ProbeError::Driver { call: "Map", .. }));
        assert_eq!(bench.totals().passes(), 2);

        let healthy = HostDevice::new(Extent::new(16, 16));
        let averages = bench.run(&healthy, &stop, &progress).unwrap();
        assert_eq!(averages.passes, 3);
        assert_eq!(bench.totals().passes(), 3);
    }

    #[test]
    fn test_bench_honours_stop_flag() {
        let device = HostDevice::new(Extent::new(16, 16));
        let mut bench = BenchRun::new(100);
        let stop = AtomicBool::new(true);

        let averages = bench.run(&device, &stop, &ProgressBar::hidden()).unwrap();
        assert_eq!(averages.passes, 0);
        assert_eq!(device.maps.get(), 0);
    }
}
