mod tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    use lightbox_core::animation::{
        ANIMATION_NAME_BLANK, ANIMATION_NAME_RAINBOW, ANIMATION_NAME_SOLID, AnimationEntry,
    };
    use lightbox_core::canvas::Canvas;
    use lightbox_core::color::Rgb;
    use lightbox_core::error::{
        AnimationFault, ControlError, HardwareError, InitializationError, LoopError, RegistryError,
    };
    use lightbox_core::generator::FrameGenerator;
    use lightbox_core::output::{HardwareProfile, SimulatedDriver, SimulatedPanel};
    use lightbox_core::parameter::{
        BRIGHTNESS, COLOR_DEPTH, GAMMA, HUE, ParameterSnapshot, ParameterStore, ROWS, TARGET_FPS,
    };
    use lightbox_core::render_loop::{LoopConfig, LoopState, RenderLoop};
    use test_log::test;

    const RED: Rgb = Rgb { r: 255, g: 0, b: 0 };

    fn standard_store() -> Arc<ParameterStore> {
        Arc::new(ParameterStore::standard(&HardwareProfile::ws2811_10x10()).unwrap())
    }

    fn config(program: &'static str) -> LoopConfig {
        LoopConfig {
            initial_program: program,
            ..LoopConfig::default()
        }
    }

    fn always_fails(
        _canvas: &mut Canvas<'_>,
        _params: &ParameterSnapshot,
        _frame_index: u64,
    ) -> Result<(), AnimationFault> {
        Err(AnimationFault::new("no frame today"))
    }

    fn wait_for(mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(Instant::now() < deadline, "condition not reached in time");
            thread::sleep(Duration::from_millis(5));
        }
    }

    fn solid_red_loop() -> (RenderLoop<SimulatedDriver>, SimulatedPanel, Arc<ParameterStore>) {
        let store = standard_store();
        store.set(HUE, 0.0).unwrap();
        store.set(BRIGHTNESS, 1.0).unwrap();
        let (driver, panel) = SimulatedDriver::new();
        let render_loop = RenderLoop::new(
            driver,
            Arc::clone(&store),
            FrameGenerator::with_builtins(),
            config(ANIMATION_NAME_SOLID),
        )
        .unwrap();
        (render_loop, panel, store)
    }

    #[test]
    fn test_step_renders_and_commits() {
        let (mut render_loop, panel, store) = solid_red_loop();
        assert_eq!(render_loop.state(), LoopState::Running);

        let plan = render_loop.step().unwrap();
        assert!(plan.sleep <= render_loop.pacer().target_interval());
        assert_eq!(panel.submits(), 1);
        assert!(panel.frame().iter().all(|pixel| *pixel == RED));

        store.set(BRIGHTNESS, 0.5).unwrap();
        render_loop.step().unwrap();
        assert!(
            panel
                .frame()
                .iter()
                .all(|pixel| *pixel == Rgb { r: 128, g: 0, b: 0 })
        );

        let status = render_loop.status().unwrap();
        assert_eq!(status.program, ANIMATION_NAME_SOLID);
        assert_eq!(status.frame_index, 2);
        assert_eq!(status.performance.total_frames, 2);
    }

    #[test]
    fn test_live_parameters_apply_at_tick_boundary() {
        let (mut render_loop, _panel, store) = solid_red_loop();
        store.set(GAMMA, 1.4).unwrap();
        store.set(COLOR_DEPTH, 5i64).unwrap();
        store.set(TARGET_FPS, 30i64).unwrap();
        assert!((render_loop.pipeline().gamma() - 2.2).abs() < f64::EPSILON);

        render_loop.step().unwrap();
        assert!((render_loop.pipeline().gamma() - 1.4).abs() < f64::EPSILON);
        assert_eq!(render_loop.pipeline().color_depth(), 5);
        assert_eq!(render_loop.pacer().config().target_fps, 30);
    }

    #[test]
    fn test_dimmed_frame_stays_on_depth_grid() {
        let (mut render_loop, panel, store) = solid_red_loop();
        for (bits, brightness) in [(1i64, 0.5), (1, 0.9), (2, 0.75), (3, 0.3), (5, 0.6)] {
            store.set(COLOR_DEPTH, bits).unwrap();
            store.set(BRIGHTNESS, brightness).unwrap();
            render_loop.step().unwrap();

            let mask = !(0xFFu8 >> bits);
            for pixel in panel.frame() {
                assert_eq!(pixel.r & !mask, 0, "depth {bits}, brightness {brightness}");
                assert_eq!(pixel.g, 0);
                assert_eq!(pixel.b, 0);
            }
        }

        // 255 masked to 128, dimmed by 0.9 to 115, masked again
        store.set(COLOR_DEPTH, 1i64).unwrap();
        store.set(BRIGHTNESS, 0.9).unwrap();
        render_loop.step().unwrap();
        assert!(panel.frame().iter().all(|pixel| pixel.r == 0));
    }

    #[test]
    fn test_sample_period_is_measured_between_starts() {
        let (mut render_loop, _panel, _store) = solid_red_loop();
        let plan = render_loop.step().unwrap();
        let first = render_loop.monitor().latest().unwrap().total;
        assert!(first >= plan.sleep);

        // Oversleep well past the planned interval
        thread::sleep(Duration::from_millis(40));
        render_loop.step().unwrap();
        let second = render_loop.monitor().latest().unwrap();
        assert!(second.total.as_millis() >= 40);
        assert!(second.fps() < 26.0);
    }

    #[test]
    fn test_hardware_change_reinitializes_output() {
        let (mut render_loop, panel, store) = solid_red_loop();
        render_loop.step().unwrap();
        assert_eq!(panel.initializations(), 1);

        store.set(ROWS, 4i64).unwrap();
        assert_eq!(render_loop.output().profile().rows, 10);
        render_loop.step().unwrap();

        assert_eq!(panel.initializations(), 2);
        assert_eq!(render_loop.output().profile().rows, 4);
        assert_eq!(panel.frame().len(), 40);
        assert!(panel.frame().iter().all(|pixel| *pixel == RED));
    }

    #[test]
    fn test_faulting_program_falls_back_without_stopping() {
        let store = standard_store();
        let (driver, panel) = SimulatedDriver::new();
        let mut generator = FrameGenerator::with_builtins();
        generator
            .register(AnimationEntry::new("broken", always_fails))
            .unwrap();
        let mut render_loop =
            RenderLoop::new(driver, store, generator, config("broken")).unwrap();

        for _ in 0..3 {
            render_loop.step().unwrap();
        }
        assert_eq!(panel.submits(), 0);
        assert_eq!(render_loop.generator().active_name(), ANIMATION_NAME_BLANK);
        assert_eq!(render_loop.state(), LoopState::Running);

        render_loop.step().unwrap();
        assert_eq!(panel.submits(), 1);
        assert!(panel.is_blank());
        assert!(render_loop.status().unwrap().last_fault.is_some());
    }

    #[test]
    fn test_status_serializes() {
        let (mut render_loop, _panel, _store) = solid_red_loop();
        render_loop.step().unwrap();
        let status = serde_json::to_value(render_loop.status().unwrap()).unwrap();
        assert_eq!(status["state"], "running");
        assert_eq!(status["program"], ANIMATION_NAME_SOLID);
        assert_eq!(status["profile"]["wiring"], "serpentine");
    }

    #[test]
    fn test_initialization_error_before_any_frame() {
        let (driver, panel) = SimulatedDriver::new();
        let result = RenderLoop::start(
            driver.failing_init(),
            standard_store(),
            FrameGenerator::with_builtins(),
            LoopConfig::default(),
        );
        assert!(matches!(result, Err(InitializationError::Driver(_))));
        assert_eq!(panel.submits(), 0);
    }

    #[test]
    fn test_threaded_lifecycle() {
        let (driver, panel) = SimulatedDriver::new();
        let handle = RenderLoop::start(
            driver,
            standard_store(),
            FrameGenerator::with_builtins(),
            config(ANIMATION_NAME_RAINBOW),
        )
        .unwrap();
        wait_for(|| panel.submits() >= 3);
        assert_eq!(handle.state(), LoopState::Running);

        handle.pause().unwrap();
        wait_for(|| handle.state() == LoopState::Paused);
        let paused_at = handle.status().unwrap().frame_index;
        thread::sleep(Duration::from_millis(60));
        assert_eq!(handle.status().unwrap().frame_index, paused_at);

        handle.resume().unwrap();
        wait_for(|| handle.status().unwrap().frame_index > paused_at);

        assert!(matches!(
            handle.switch_program("plasma"),
            Err(ControlError::Registry(RegistryError::UnknownProgram(_)))
        ));
        handle.switch_program(ANIMATION_NAME_SOLID).unwrap();
        wait_for(|| handle.status().unwrap().program == ANIMATION_NAME_SOLID);

        let report = handle.stop().unwrap();
        assert!(!report.emergency);
        assert_eq!(report.program, ANIMATION_NAME_SOLID);
        assert!(report.frames > 0);
        assert!(panel.is_blank());
    }

    #[test]
    fn test_emergency_stop_clears_panel() {
        let store = standard_store();
        store.set(BRIGHTNESS, 1.0).unwrap();
        let (driver, panel) = SimulatedDriver::new();
        let handle = RenderLoop::start(
            driver,
            store,
            FrameGenerator::with_builtins(),
            config(ANIMATION_NAME_SOLID),
        )
        .unwrap();
        wait_for(|| panel.submits() > 0);
        assert!(!panel.is_blank());

        let report = handle.emergency_stop().unwrap();
        assert!(report.emergency);
        assert!(panel.is_blank());
    }

    #[test]
    fn test_hardware_error_stops_loop() {
        let (driver, panel) = SimulatedDriver::new();
        let mut handle = RenderLoop::start(
            driver.failing_after(3),
            standard_store(),
            FrameGenerator::with_builtins(),
            config(ANIMATION_NAME_RAINBOW),
        )
        .unwrap();
        wait_for(|| handle.is_finished());

        assert_eq!(handle.state(), LoopState::Stopped);
        assert!(matches!(
            handle.join(),
            Err(LoopError::Hardware(HardwareError::Submit(_)))
        ));
        assert_eq!(panel.submits(), 3);
        // Driver released after the fatal frame
        assert!(panel.profile().is_none());
        assert!(matches!(handle.pause(), Err(ControlError::NotRunning)));
    }
}
