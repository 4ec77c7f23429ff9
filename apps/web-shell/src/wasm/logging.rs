use super::*;

    use std::io;

    use dw_utilities_core::config::DEFAULT_LOG_FILTER;
    use tracing_subscriber::EnvFilter;

    /// Buffers one formatted event and hands it to `console.log` on flush.
    #[derive(Default)]
    pub(super) struct ConsoleWriter {
        buffer: Vec<u8>,
    }

    impl io::Write for ConsoleWriter {
        fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
            self.buffer.extend_from_slice(bytes);
            Ok(bytes.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            if self.buffer.is_empty() {
                return Ok(());
            }
            let line = String::from_utf8_lossy(&self.buffer);
            console_log_text(line.trim_end());
            self.buffer.clear();
            Ok(())
        }
    }

    impl Drop for ConsoleWriter {
        fn drop(&mut self) {
            let _ = io::Write::flush(self);
        }
    }

    /// Installs the console subscriber once; later calls keep the first one.
    pub(super) fn init_logging(filter: &str) {
        let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(ConsoleWriter::default)
            .without_time()
            .with_ansi(false)
            .try_init();
    }
