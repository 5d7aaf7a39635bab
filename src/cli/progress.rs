use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Adds a ticking spinner to `multi`, or returns `None` when progress
/// display is disabled.
pub fn create_spinner(multi: Option<&MultiProgress>, message: &str) -> Result<Option<ProgressBar>> {
    let Some(multi) = multi else {
        return Ok(None);
    };

    let pb = multi.add(ProgressBar::new_spinner());
    pb.set_style(ProgressStyle::with_template(
        "{spinner:.green} {msg} | elapsed: {elapsed_precise}",
    )?);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb.set_message(message.to_string());

    Ok(Some(pb))
}

pub fn finish_spinner(pb: Option<ProgressBar>, message: String) {
    if let Some(pb) = pb {
        pb.finish_with_message(message);
    }
}
