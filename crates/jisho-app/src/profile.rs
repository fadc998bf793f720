use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context;
use jisho_config::Config;
use tracing_subscriber::EnvFilter;

/// Load a JSON config file, or build one from the environment.
///
/// Fields missing from the file keep their environment/default values.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::new());
    };

    let file = File::open(path).with_context(|| format!("cannot open config {}", path.display()))?;
    let reader = BufReader::new(file);
    let config = serde_json::from_reader(reader)
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(config)
}

/// Install the global subscriber. Logs go to stderr so stdout stays parseable.
pub fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
