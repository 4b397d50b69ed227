#![deny(unsafe_code)]
#![deny(warnings)]
#![no_main]
#![no_std]

use defmt_rtt as _; // global logger
use panic_probe as _;
use rtic::app;
use rtic_monotonics::stm32::prelude::*;

mod device_id;
mod eth;
mod network;
mod sensors;
mod tls_buffers;

stm32_tim2_monotonic!(Mono, 1_000_000);

#[app(device = embassy_stm32, peripherals = true, dispatchers = [USART1, USART2, USART3])]
mod app {
    use super::*;
    use defmt::info;
    use embassy_futures::join::join3;
    use embassy_stm32::adc::{Adc, AdcChannel, SampleTime};
    use embassy_stm32::exti::ExtiInput;
    use embassy_stm32::gpio::{Input, Level, Output, Pull, Speed};
    use embassy_stm32::peripherals;
    use embassy_stm32::rcc::{Hse, HseMode};
    use embassy_stm32::spi::{self, Spi};
    use embassy_stm32::time::Hertz;
    use sensor_report_core::Reporter;

    use device_id::ChipIdentity;
    use network::{manager, BoardConnector, NetworkConfig, REPORT_INTERVAL_SECS};
    use sensors::{GasSensor, MotionSensor, SensorConfig, SharedAdc, SoundSensor, TemperatureSensor};

    type SpiPeripheral = embassy_stm32::Peri<'static, peripherals::SPI2>;
    type PinPB13 = embassy_stm32::Peri<'static, peripherals::PB13>;
    type PinPB15 = embassy_stm32::Peri<'static, peripherals::PB15>;
    type PinPB14 = embassy_stm32::Peri<'static, peripherals::PB14>;
    type PinPC6 = embassy_stm32::Peri<'static, peripherals::PC6>;
    type PinPC3 = embassy_stm32::Peri<'static, peripherals::PC3>;
    type PinPC2 = embassy_stm32::Peri<'static, peripherals::PC2>;
    type ExtiChannel = embassy_stm32::Peri<'static, peripherals::EXTI2>;
    type DmaTx = embassy_stm32::Peri<'static, peripherals::DMA1_CH4>;
    type DmaRx = embassy_stm32::Peri<'static, peripherals::DMA1_CH3>;

    struct NetworkPeripherals {
        spi: SpiPeripheral,
        sck: PinPB13,
        mosi: PinPB15,
        miso: PinPB14,
        cs: PinPC6,
        reset: PinPC3,
        int: PinPC2,
        exti: ExtiChannel,
        dma_tx: DmaTx,
        dma_rx: DmaRx,
        rng: embassy_stm32::Peri<'static, peripherals::RNG>,
    }

    struct SensorPeripherals {
        adc: embassy_stm32::Peri<'static, peripherals::ADC1>,
        /// Microphone on A0
        sound: embassy_stm32::Peri<'static, peripherals::PA4>,
        /// Gas sensor on A1
        gas: embassy_stm32::Peri<'static, peripherals::PA5>,
        /// PIR output
        motion: embassy_stm32::Peri<'static, peripherals::PC7>,
    }

    // RNG interrupt binding for hardware random number generator
    embassy_stm32::bind_interrupts!(struct RngIrqs {
        RNG => embassy_stm32::rng::InterruptHandler<peripherals::RNG>;
    });

    #[shared]
    struct Shared {}

    #[local]
    struct Local {}

    #[init]
    fn init(_cx: init::Context) -> (Shared, Local) {
        info!("Sensor node starting...");

        // Adafruit Feather STM32F405: 12 MHz HSE
        let mut config = embassy_stm32::Config::default();
        config.rcc.hse = Some(Hse {
            freq: Hertz(12_000_000),
            mode: HseMode::Oscillator,
        });

        // Configure PLL for system clock and RNG (48MHz required for RNG)
        // HSE (12 MHz) / PREDIV(6) = 2 MHz (PLL input)
        // 2 MHz * MUL(168) = 336 MHz (VCO)
        // VCO / DIVP(4) = 84 MHz (SYSCLK)
        // VCO / DIVQ(7) = 48 MHz (USB/RNG clock)
        config.rcc.pll_src = embassy_stm32::rcc::PllSource::HSE;
        config.rcc.pll = Some(embassy_stm32::rcc::Pll {
            prediv: embassy_stm32::rcc::PllPreDiv::DIV6,
            mul: embassy_stm32::rcc::PllMul::MUL168,
            divp: Some(embassy_stm32::rcc::PllPDiv::DIV4),
            divq: Some(embassy_stm32::rcc::PllQDiv::DIV7),
            divr: None,
        });
        config.rcc.sys = embassy_stm32::rcc::Sysclk::PLL1_P;
        config.rcc.ahb_pre = embassy_stm32::rcc::AHBPrescaler::DIV1; // 84 MHz
        config.rcc.apb1_pre = embassy_stm32::rcc::APBPrescaler::DIV2; // 42 MHz
        config.rcc.apb2_pre = embassy_stm32::rcc::APBPrescaler::DIV1; // 84 MHz

        let p = embassy_stm32::init(config);
        info!("PLL configured: SYSCLK=84MHz, PLLQ=48MHz for RNG");

        // TIM2 on APB1: timer clock = 2*APB1 when prescaler != 1
        let timer_clock_hz = 84_000_000;
        Mono::start(timer_clock_hz);
        info!("TIM2 monotonic timer initialized at 1 MHz");

        let net_periph = NetworkPeripherals {
            spi: p.SPI2,
            sck: p.PB13,
            mosi: p.PB15,
            miso: p.PB14,
            cs: p.PC6,
            reset: p.PC3,
            int: p.PC2,
            exti: p.EXTI2,
            dma_tx: p.DMA1_CH4,
            dma_rx: p.DMA1_CH3,
            rng: p.RNG,
        };

        let sensor_periph = SensorPeripherals {
            adc: p.ADC1,
            sound: p.PA4,
            gas: p.PA5,
            motion: p.PC7,
        };

        network_task::spawn(net_periph, sensor_periph).ok();

        (Shared {}, Local {})
    }

    /// Network task - runs the stack and the report loop
    ///
    /// Stack is !Send and must remain within this task.
    #[task(priority = 1)]
    async fn network_task(
        _cx: network_task::Context,
        periph: NetworkPeripherals,
        sensor_periph: SensorPeripherals,
    ) -> ! {
        use embassy_net::{Config, StackResources};
        use static_cell::StaticCell;

        info!("Network task started");
        let net_config = NetworkConfig::default();

        // Setup ethernet peripherals
        let mut spi_config = spi::Config::default();
        spi_config.frequency = Hertz(10_000_000); // 10 MHz for W5500

        let spi = Spi::new(
            periph.spi,
            periph.sck,
            periph.mosi,
            periph.miso,
            periph.dma_tx,
            periph.dma_rx,
            spi_config,
        );

        let cs = Output::new(periph.cs, Level::High, Speed::VeryHigh);
        let reset = Output::new(periph.reset, Level::High, Speed::Low);
        let int = ExtiInput::new(periph.int, periph.exti, Pull::Up);

        let eth_periph = eth::EthPeripherals {
            spi,
            cs,
            reset,
            int,
        };

        let (device, w5500_runner) = eth::init_w5500(eth_periph, net_config.mac_addr).await;

        static RESOURCES: StaticCell<StackResources<3>> = StaticCell::new();
        let (stack, mut net_runner) = embassy_net::new(
            device,
            Config::dhcpv4(Default::default()),
            RESOURCES.init(StackResources::new()),
            net_config.seed,
        );
        info!("Network stack initialized with DHCP");

        let app_logic = async {
            manager::wait_for_config(&stack).await;
            run_reporter(stack, periph.rng, sensor_periph).await;
        };

        join3(w5500_runner.run(), net_runner.run(), app_logic).await;
    }

    async fn run_reporter(
        stack: embassy_net::Stack<'static>,
        rng_periph: embassy_stm32::Peri<'static, peripherals::RNG>,
        periph: SensorPeripherals,
    ) -> ! {
        use embassy_stm32::rng::Rng;

        let Some(tls) = tls_buffers::take() else {
            defmt::panic!("TLS buffers already taken");
        };
        let rng = Rng::new(rng_periph, RngIrqs);
        let connector = BoardConnector::new(stack, rng, tls);

        let backend = network::backend_config();
        info!(
            "Reporting to {}:{} (tls: {})",
            backend.host,
            backend.port,
            backend.transport.is_tls()
        );
        let mut reporter = Reporter::new(backend, connector, ChipIdentity, embassy_time::Delay);

        let sensor_config = SensorConfig::default();
        let mut adc = Adc::new(periph.adc);
        adc.set_sample_time(SampleTime::CYCLES480);
        let adc = SharedAdc::new(adc);

        let mut sound = SoundSensor::new(
            &adc,
            periph.sound.degrade_adc(),
            sensor_config.sound_window_ms,
        );
        let mut temperature = TemperatureSensor::new(&adc);
        let mut gas = GasSensor::new(&adc, periph.gas.degrade_adc());
        let mut motion = MotionSensor::new(Input::new(periph.motion, Pull::Down));

        info!(
            "Report loop every {}s (sound: {}, temperature: {}, motion: {}, gas: {})",
            REPORT_INTERVAL_SECS,
            sensor_config.report_sound,
            sensor_config.report_temperature,
            sensor_config.report_motion,
            sensor_config.report_gas
        );

        loop {
            if sensor_config.report_gas {
                reporter.report_source_best_effort(&mut gas).await;
            }
            if sensor_config.report_temperature {
                reporter.report_source_best_effort(&mut temperature).await;
            }
            if sensor_config.report_motion {
                reporter.report_source_best_effort(&mut motion).await;
            }
            if sensor_config.report_sound {
                reporter.report_source_best_effort(&mut sound).await;
            }

            Mono::delay(REPORT_INTERVAL_SECS.secs()).await;
        }
    }

    /// RTIC idle task - WFI sleep mode when no tasks active
    #[idle]
    fn idle(_cx: idle::Context) -> ! {
        info!("Idle task started - entering WFI loop");
        loop {
            cortex_m::asm::wfi();
        }
    }
}
