mod tests {
    use std::collections::HashSet;

    use lightbox_core::MatrixDriver;
    use lightbox_core::color::Rgb;
    use lightbox_core::error::{HardwareError, InitializationError};
    use lightbox_core::output::{
        CoordinateMap, HardwareProfile, MatrixOutput, SimulatedDriver, Wiring,
    };

    const RED: Rgb = Rgb { r: 255, g: 0, b: 0 };
    const GREEN: Rgb = Rgb { r: 0, g: 255, b: 0 };

    fn assert_bijection(profile: &HardwareProfile) {
        let map = CoordinateMap::new(profile);
        let mut seen = HashSet::new();
        for y in 0..map.height() {
            for x in 0..map.width() {
                let index = map.map(x, y).unwrap();
                assert!(index < map.len());
                assert!(seen.insert(index), "{index} mapped twice");
                assert_eq!(map.unmap(index), Some((x, y)));
            }
        }
        assert_eq!(seen.len(), profile.pixel_count());
    }

    #[test]
    fn test_mapping_is_bijective() {
        let mut profile = HardwareProfile::ws2811_10x10();
        assert_bijection(&profile);
        profile.wiring = Wiring::Progressive;
        assert_bijection(&profile);

        let mut chained = HardwareProfile::hub75_64x64_pi3();
        chained.rows = 8;
        chained.cols = 16;
        chained.chain_length = 3;
        chained.parallel = 2;
        for wiring in [Wiring::Serpentine, Wiring::Progressive] {
            chained.wiring = wiring;
            assert_bijection(&chained);
        }
    }

    #[test]
    fn test_serpentine_reverses_odd_rows() {
        let map = CoordinateMap::new(&HardwareProfile::ws2811_10x10());
        assert_eq!(map.map(0, 0), Some(0));
        assert_eq!(map.map(9, 0), Some(9));
        assert_eq!(map.map(0, 1), Some(19));
        assert_eq!(map.map(9, 1), Some(10));
        assert_eq!(map.map(0, 2), Some(20));
        assert_eq!(map.map(10, 0), None);
        assert_eq!(map.map(0, 10), None);
        assert_eq!(map.unmap(100), None);
    }

    #[test]
    fn test_progressive_is_row_major() {
        let mut profile = HardwareProfile::ws2811_10x10();
        profile.wiring = Wiring::Progressive;
        let map = CoordinateMap::new(&profile);
        assert_eq!(map.map(0, 1), Some(10));
        assert_eq!(map.map(9, 1), Some(19));
    }

    #[test]
    fn test_serpentine_reverses_within_each_panel() {
        let mut profile = HardwareProfile::ws2811_10x10();
        profile.rows = 2;
        profile.cols = 2;
        profile.chain_length = 2;
        let map = CoordinateMap::new(&profile);
        assert_eq!((map.width(), map.height()), (4, 2));

        let row = |y| (0..4).map(|x| map.map(x, y).unwrap()).collect::<Vec<_>>();
        assert_eq!(row(0), [0, 1, 4, 5]);
        assert_eq!(row(1), [3, 2, 7, 6]);
        assert_eq!(map.unmap(7), Some((2, 1)));
    }

    #[test]
    fn test_chained_panels_are_panel_major() {
        let mut profile = HardwareProfile::ws2811_10x10();
        profile.wiring = Wiring::Progressive;
        profile.rows = 2;
        profile.cols = 2;
        profile.chain_length = 2;
        profile.parallel = 2;
        let map = CoordinateMap::new(&profile);
        assert_eq!((map.width(), map.height()), (4, 4));
        // Second panel of the first chain starts after four pixels
        assert_eq!(map.map(2, 0), Some(4));
        // First panel of the second chain
        assert_eq!(map.map(0, 2), Some(8));
        assert_eq!(map.map(3, 3), Some(15));
    }

    #[test]
    fn test_profile_validation() {
        let mut profile = HardwareProfile::ws2811_10x10();
        assert!(profile.validate().is_ok());
        profile.rows = 0;
        assert!(matches!(
            profile.validate(),
            Err(InitializationError::InvalidProfile(_))
        ));

        let mut profile = HardwareProfile::hub75_64x64_pi3();
        profile.pwm_bits = 12;
        assert!(profile.validate().is_err());

        let mut profile = HardwareProfile::hub75_64x64_pi4();
        profile.rows = 512;
        profile.chain_length = 16;
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_presets_differ_in_timing() {
        let pi3 = HardwareProfile::hub75_64x64_pi3();
        let pi4 = HardwareProfile::hub75_64x64_pi4();
        assert_eq!(pi3.pixel_count(), pi4.pixel_count());
        assert_ne!(pi3.gpio_slowdown, pi4.gpio_slowdown);
        assert_ne!(pi3.pwm_bits, pi4.pwm_bits);
    }

    #[test]
    fn test_commit_swaps_buffers() {
        let (driver, panel) = SimulatedDriver::new();
        let mut output = MatrixOutput::new(driver, HardwareProfile::ws2811_10x10()).unwrap();
        assert_eq!(panel.initializations(), 1);

        let mut handle = output.begin_write();
        let index = handle.map.map(0, 1).unwrap();
        handle.pixels[index] = RED;
        output.commit().unwrap();
        assert_eq!(panel.frame()[19], RED);
        assert_eq!(output.displayed()[19], RED);

        let mut handle = output.begin_write();
        handle.pixels.fill(GREEN);
        output.commit().unwrap();
        assert!(panel.frame().iter().all(|pixel| *pixel == GREEN));
        assert_eq!(panel.submits(), 2);
    }

    #[test]
    fn test_double_commit_never_aliases() {
        let (driver, panel) = SimulatedDriver::new();
        let mut output = MatrixOutput::new(driver, HardwareProfile::ws2811_10x10()).unwrap();

        output.begin_write().pixels.fill(RED);
        output.commit().unwrap();
        output.commit().unwrap();
        output.commit().unwrap();

        assert_ne!(output.displayed().as_ptr(), output.write_target().as_ptr());
        assert!(output.displayed().iter().all(|pixel| *pixel == RED));
        assert!(panel.frame().iter().all(|pixel| *pixel == RED));
        assert_eq!(panel.submits(), 3);

        // A fresh write never touches the displayed frame
        output.begin_write().pixels.fill(GREEN);
        assert!(output.displayed().iter().all(|pixel| *pixel == RED));
    }

    #[test]
    fn test_abandoned_write_keeps_frame() {
        let (driver, panel) = SimulatedDriver::new();
        let mut output = MatrixOutput::new(driver, HardwareProfile::ws2811_10x10()).unwrap();
        output.begin_write().pixels.fill(RED);
        output.commit().unwrap();

        output.begin_write().pixels.fill(GREEN);
        output.abandon_write();
        output.commit().unwrap();
        assert!(panel.frame().iter().all(|pixel| *pixel == RED));
    }

    #[test]
    fn test_clear_blanks_panel() {
        let (driver, panel) = SimulatedDriver::new();
        let mut output = MatrixOutput::new(driver, HardwareProfile::ws2811_10x10()).unwrap();
        output.begin_write().pixels.fill(RED);
        output.commit().unwrap();
        output.clear().unwrap();
        assert!(panel.is_blank());
    }

    #[test]
    fn test_reinitialize_resizes() {
        let (driver, panel) = SimulatedDriver::new();
        let mut output = MatrixOutput::new(driver, HardwareProfile::ws2811_10x10()).unwrap();

        let mut profile = HardwareProfile::ws2811_10x10();
        profile.rows = 4;
        output.reinitialize(profile).unwrap();
        assert_eq!(panel.initializations(), 2);
        assert_eq!(output.displayed().len(), 40);
        assert_eq!(output.coordinate_map().height(), 4);
        assert_eq!(panel.profile(), Some(profile));

        profile.cols = 0;
        assert!(output.reinitialize(profile).is_err());
        assert_eq!(output.profile().cols, 10);
    }

    #[test]
    fn test_driver_failures() {
        let (driver, _panel) = SimulatedDriver::new();
        assert!(matches!(
            MatrixOutput::new(driver.failing_init(), HardwareProfile::ws2811_10x10()),
            Err(InitializationError::Driver(_))
        ));

        let (driver, _panel) = SimulatedDriver::new();
        let mut output =
            MatrixOutput::new(driver.failing_after(1), HardwareProfile::ws2811_10x10()).unwrap();
        output.commit().unwrap();
        assert!(matches!(output.commit(), Err(HardwareError::Submit(_))));
    }

    #[test]
    fn test_simulated_driver_checks_frame_size() {
        let (mut driver, _panel) = SimulatedDriver::new();
        let profile = HardwareProfile::ws2811_10x10();
        assert_eq!(
            driver.submit(&[RED; 3], &profile),
            Err(HardwareError::NotInitialized)
        );
        driver.initialize(&profile).unwrap();
        assert_eq!(
            driver.submit(&[RED; 3], &profile),
            Err(HardwareError::FrameSize {
                expected: 100,
                actual: 3
            })
        );
    }
}
