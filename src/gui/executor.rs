use std::future::Future;
use futures::io;
use iced_futures::{Executor, MaybeSend};
use tokio::runtime::{Builder, Runtime};

/// tokio runtime that runs the BLE work of the application.
pub struct MyExecutor {
    runtime: Runtime,
}

impl Executor for MyExecutor {
    fn new() -> Result<Self, io::Error> {
        let runtime = Builder::new_multi_thread()
            .enable_all()
            .thread_name("ble-explorer-worker")
            .build()?;

        Ok(MyExecutor { runtime })
    }

    fn spawn(&self, future: impl Future<Output = ()> + MaybeSend + 'static) {
        let _ = self.runtime.spawn(future);
    }

    fn enter<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.runtime.enter();
        f()
    }
}
