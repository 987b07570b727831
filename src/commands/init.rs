use animal_ingest::config::{Config, DEFAULT_CONFIG_FILE, DEFAULT_MONGO_URL};
use anyhow::Result;
use std::path::PathBuf;

/// Write a commented default configuration file into `dir`
pub async fn init_config(dir: PathBuf, force: bool) -> Result<()> {
    let config_path = dir.join(DEFAULT_CONFIG_FILE);
    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        );
    }
    std::fs::create_dir_all(&dir)?;
    std::fs::write(&config_path, render_default())?;
    println!("Created configuration file: {}", config_path.display());
    Ok(())
}

fn render_default() -> String {
    let config = Config::default();
    format!(
        r#"# animal-ingest configuration
#
# Access keys may be left out here and supplied through the environment:
#   DATA_GO_KR_SERVICE_KEY  portal key (abandonments, shelters)
#   MAFRA_API_KEY           grid open API key (registrations)
#   MONGO_URL               MongoDB connection string

[http]
timeout_secs = {}
connect_timeout_secs = {}

[retry]
max_attempts = {}
base_delay_ms = {}
# "fatal" gives up on a page at the first 4xx, "retry" retries it
client_errors = "fatal"

[store]
# url = "{}"
database = "{}"
ensure_indexes = {}

[logging]
format = "text"
level = "info"

[abandonment]
# service_key = ""
base_url = "{}"
start_date = "{}"
end_date = "{}"
use_regions = {}
# Region codes or names to restrict the run to; empty means all regions
regions = []
page_size = {}
page_delay_ms = {}
collection = "{}"

[registration]
# api_key = ""
endpoint = "{}"
service = "{}"
region_param = "{}"
# Region names queried one by one; empty means one query for everything
regions = []
page_size = {}
page_delay_ms = {}
collection = "{}"

[shelter]
# service_key = ""
base_url = "{}"
path = "{}"
page_size = {}
page_delay_ms = {}
collection = "{}"
"#,
        config.http.timeout_secs,
        config.http.connect_timeout_secs,
        config.retry.max_attempts,
        config.retry.base_delay_ms,
        DEFAULT_MONGO_URL,
        config.store.database,
        config.store.ensure_indexes,
        config.abandonment.base_url,
        config.abandonment.start_date,
        config.abandonment.end_date,
        config.abandonment.use_regions,
        config.abandonment.page_size,
        config.abandonment.page_delay_ms,
        config.abandonment.collection,
        config.registration.endpoint,
        config.registration.service,
        config.registration.region_param,
        config.registration.page_size,
        config.registration.page_delay_ms,
        config.registration.collection,
        config.shelter.base_url,
        config.shelter.path,
        config.shelter.page_size,
        config.shelter.page_delay_ms,
        config.shelter.collection,
    )
}
