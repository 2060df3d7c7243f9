use crate::types::Area;

pub const DEFAULT_DEPOT_LABEL: &str = "Iscon Center, Satellite, Ahmedabad";
pub const DEFAULT_DEPOT_AREA: Area = Area::Satellite;

pub const DEFAULT_TOP_K: usize = 3;
pub const DEFAULT_MAX_DELIVERY_ATTEMPTS: u32 = 3;

pub const DEFAULT_BIND: &str = "127.0.0.1:5003";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_LOGS_DIR: &str = "logs";

pub const ATTEMPT_LOG_FILE: &str = "dataset.csv";
pub const PENDING_SNAPSHOT_FILE: &str = "pending_orders.json";

pub const DEFAULT_EXTERNAL_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_CB_THRESHOLD: u32 = 3;
pub const DEFAULT_CB_RECOVERY_SECS: u64 = 300;

pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_CHAT_API_URL: &str = "https://api.perplexity.ai/chat/completions";
pub const DEFAULT_CHAT_MODEL: &str = "sonar";
