//! Double-buffered hand-off to the hardware driver.

mod mapping;
mod profile;
mod simulated;

use log::{debug, info};

use crate::MatrixDriver;
use crate::color::{BLACK, Rgb};
use crate::error::{HardwareError, InitializationError};

pub use mapping::CoordinateMap;
pub use profile::{HardwareProfile, MAX_PIXELS, WIRING_NAMES, Wiring};
pub use simulated::{SimulatedDriver, SimulatedPanel};

/// Mutable view of the off-screen buffer handed to the frame generator
pub struct WriteHandle<'a> {
    pub pixels: &'a mut [Rgb],
    pub map: &'a CoordinateMap,
}

/// Owns the hardware driver and the two frame buffers.
///
/// One buffer is displayed, the other is the write target. [`commit`] swaps
/// their roles and submits the freshly written buffer, so the driver never
/// sees a frame that is still being drawn.
///
/// [`commit`]: MatrixOutput::commit
pub struct MatrixOutput<D: MatrixDriver> {
    driver: D,
    profile: HardwareProfile,
    map: CoordinateMap,
    buffers: [Box<[Rgb]>; 2],
    displayed: usize,
    write_pending: bool,
}

impl<D: MatrixDriver> MatrixOutput<D> {
    /// Initialize the driver against `profile` and allocate both buffers
    pub fn new(mut driver: D, profile: HardwareProfile) -> Result<Self, InitializationError> {
        profile.validate()?;
        driver.initialize(&profile)?;
        info!(
            "[MatrixOutput] initialized {}x{} ({} pixels, {:?}, pwm {} bits, slowdown {})",
            profile.width(),
            profile.height(),
            profile.pixel_count(),
            profile.wiring,
            profile.pwm_bits,
            profile.gpio_slowdown,
        );
        Ok(Self {
            driver,
            map: CoordinateMap::new(&profile),
            buffers: Self::allocate(&profile),
            profile,
            displayed: 0,
            write_pending: false,
        })
    }

    fn allocate(profile: &HardwareProfile) -> [Box<[Rgb]>; 2] {
        let count = profile.pixel_count();
        [
            vec![BLACK; count].into_boxed_slice(),
            vec![BLACK; count].into_boxed_slice(),
        ]
    }

    const fn write_index(&self) -> usize {
        1 - self.displayed
    }

    /// Cleared off-screen buffer to draw the next frame into
    pub fn begin_write(&mut self) -> WriteHandle<'_> {
        let index = self.write_index();
        self.write_pending = true;
        let pixels = &mut self.buffers[index];
        pixels.fill(BLACK);
        WriteHandle {
            pixels,
            map: &self.map,
        }
    }

    /// Drop the pending write; the displayed frame stays on the panel
    pub fn abandon_write(&mut self) {
        self.write_pending = false;
    }

    /// Swap the written buffer onto the panel.
    ///
    /// Without a pending write the displayed frame is submitted again and no
    /// swap happens.
    pub fn commit(&mut self) -> Result<(), HardwareError> {
        if self.write_pending {
            self.displayed = self.write_index();
            self.write_pending = false;
        }
        self.driver
            .submit(&self.buffers[self.displayed], &self.profile)
    }

    /// Display an all-black frame
    pub fn clear(&mut self) -> Result<(), HardwareError> {
        let index = self.write_index();
        self.buffers[index].fill(BLACK);
        self.write_pending = true;
        self.commit()
    }

    /// Tear down and recreate the buffers and the driver connection
    pub fn reinitialize(&mut self, profile: HardwareProfile) -> Result<(), InitializationError> {
        profile.validate()?;
        debug!("[MatrixOutput] re-initializing with {:?}", profile);
        self.driver.shutdown();
        self.driver.initialize(&profile)?;
        self.map = CoordinateMap::new(&profile);
        self.buffers = Self::allocate(&profile);
        self.profile = profile;
        self.displayed = 0;
        self.write_pending = false;
        info!(
            "[MatrixOutput] re-initialized {}x{}",
            profile.width(),
            profile.height()
        );
        Ok(())
    }

    /// Physical index of a logical coordinate
    pub fn map_coordinate(&self, x: usize, y: usize) -> Option<usize> {
        self.map.map(x, y)
    }

    /// Logical coordinate of a physical index
    pub fn unmap_index(&self, index: usize) -> Option<(usize, usize)> {
        self.map.unmap(index)
    }

    /// Blank the panel and release the driver
    pub fn shutdown(&mut self) {
        if let Err(err) = self.clear() {
            debug!("[MatrixOutput] clear on shutdown failed: {}", err);
        }
        self.driver.shutdown();
    }

    pub const fn profile(&self) -> &HardwareProfile {
        &self.profile
    }

    pub const fn coordinate_map(&self) -> &CoordinateMap {
        &self.map
    }

    /// Buffer currently on the panel
    pub fn displayed(&self) -> &[Rgb] {
        &self.buffers[self.displayed]
    }

    /// Buffer the next frame will be written into
    pub fn write_target(&self) -> &[Rgb] {
        &self.buffers[self.write_index()]
    }

    pub const fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }
}
