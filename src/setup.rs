use std::fs::File;

use log::LevelFilter;
use simplelog::{ConfigBuilder, WriteLogger};

use crate::config;
use crate::osc_sink::{OscPreviewSink, PreviewOutput};

/// File logger in the config dir; the terminal is owned by the UI, so
/// nothing may log to stdout. Failure to set up logging is non-fatal.
pub fn init_logging() {
    let Some(dir) = config::data_dir() else {
        return;
    };
    let Ok(file) = File::create(dir.join("weft.log")) else {
        return;
    };
    let config = ConfigBuilder::new().set_time_format_rfc3339().build();
    let _ = WriteLogger::init(LevelFilter::Info, config, file);
}

/// Preview output, degrading to a no-op sink when the socket can't be bound
/// so editing still works without an audio server.
pub fn preview_output(osc_addr: &str) -> PreviewOutput {
    match OscPreviewSink::connect(osc_addr) {
        Ok(sink) => {
            log::info!("preview audio via OSC to {osc_addr}");
            PreviewOutput::Osc(sink)
        }
        Err(e) => {
            log::warn!("no preview audio ({osc_addr}: {e}); running silent");
            PreviewOutput::Silent
        }
    }
}
