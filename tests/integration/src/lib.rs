// Licensed under the Apache-2.0 license

mod test_boot_flow;
mod test_multi_hart;

#[cfg(test)]
mod test {
    use hss_config::IpiConfig;
    use hss_platform::HartId;
    use hss_ssmb::{HandlerRegistry, Ipi, IpiData};
    use hss_testing::SimSoc;
    use log::LevelFilter;
    use simple_logger::SimpleLogger;
    use std::time::{Duration, Instant};

    pub(crate) const TEST_TIMEOUT: Duration = Duration::from_secs(60);

    pub(crate) fn init_logging() {
        let _ = SimpleLogger::new().with_level(LevelFilter::Info).init();
    }

    /// SoC model and IPI store shared by the threads standing in for harts.
    #[derive(Clone, Copy)]
    pub(crate) struct World {
        pub soc: &'static SimSoc,
        pub data: &'static IpiData,
        pub started: Instant,
    }

    impl World {
        pub fn new() -> Self {
            let data: &'static IpiData = Box::leak(Box::new(IpiData::new()));
            data.init();
            World {
                soc: Box::leak(Box::new(SimSoc::new())),
                data,
                started: Instant::now(),
            }
        }

        /// The bus as seen from `hart`. Must be called on the thread playing
        /// that hart.
        pub fn ipi(&self, hart: HartId, registry: &'static HandlerRegistry) -> &'static Ipi<'static> {
            let platform = Box::leak(Box::new(self.soc.hart(hart)));
            Box::leak(Box::new(Ipi::new(
                self.data,
                platform,
                registry,
                IpiConfig::default(),
            )))
        }

        pub fn check_timeout(&self) {
            assert!(
                self.started.elapsed() < TEST_TIMEOUT,
                "harts did not converge in time"
            );
        }
    }
}
