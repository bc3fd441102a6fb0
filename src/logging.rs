use std::{fs::{File, OpenOptions}, io, path::Path, sync::Arc};
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::{fmt, fmt::MakeWriter, prelude::*, EnvFilter, Layer, Registry};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Full,
    Json,
}

/// Keeps the run's subscriber installed. The log file is synced when it is
/// dropped.
pub struct LogGuard {
    _default: DefaultGuard,
    file: Option<Arc<File>>,
}

impl Drop for LogGuard {
    fn drop(&mut self) {
        if let Some(file) = &self.file {
            let _ = file.sync_all();
        }
    }
}

/// Installs a subscriber writing to stderr and, if `log_file` is set, appending
/// to that file. Filtering follows `RUST_LOG` and defaults to `info`.
pub fn init(log_file: Option<&Path>, format: LogFormat) -> io::Result<LogGuard> {
    let file = log_file
        .map(|path| OpenOptions::new().create(true).append(true).open(path))
        .transpose()?
        .map(Arc::new);

    let mut layers = vec![layer(format, io::stderr, true)];
    if let Some(file) = &file {
        layers.push(layer(format, file.clone(), false));
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = Registry::default()
        .with(layers)
        .with(filter);

    Ok(LogGuard {
        _default: tracing::subscriber::set_default(subscriber),
        file,
    })
}

fn layer<W>(format: LogFormat, writer: W, ansi: bool) -> Box<dyn Layer<Registry> + Send + Sync>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Full => fmt::layer()
            .with_writer(writer)
            .with_ansi(ansi)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(writer)
            .boxed(),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use tracing::{info, warn};
    use super::*;

    #[test]
    fn appends_to_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gandi-dyndns.log");
        fs::write(&path, "earlier run\n").unwrap();

        {
            let _guard = init(Some(&path), LogFormat::Full).unwrap();
            info!("public IPv4: 1.2.3.4");
            warn!("the record ghost does not exist and can not be updated");
        }

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("earlier run\n"));
        assert!(contents.contains("INFO"));
        assert!(contents.contains("public IPv4: 1.2.3.4"));
        assert!(contents.contains("WARN"));
        assert!(!contents.contains("\u{1b}["));
    }

    #[test]
    fn writes_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gandi-dyndns.log");

        {
            let _guard = init(Some(&path), LogFormat::Json).unwrap();
            info!(changed = 1, "success! 1 DNS records were changed");
        }

        let contents = fs::read_to_string(&path).unwrap();
        let line: serde_json::Value = serde_json::from_str(contents.lines().next().unwrap()).unwrap();
        assert_eq!(line["level"], "INFO");
        assert_eq!(line["fields"]["changed"], 1);
    }

    #[test]
    fn stops_logging_after_guard_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gandi-dyndns.log");

        drop(init(Some(&path), LogFormat::Full).unwrap());
        info!("after the run");

        assert!(!fs::read_to_string(&path).unwrap().contains("after the run"));
    }

    #[test]
    fn unwritable_log_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("gandi-dyndns.log");

        assert!(init(Some(&path), LogFormat::Full).is_err());
    }
}
