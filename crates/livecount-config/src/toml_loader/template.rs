//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# livecount configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[server]
# host = "0.0.0.0"
# port = 3000
# allowed_origins = ["*"]   # exact origins, or "*" for any

[transport]
# outbound_buffer = 256      # 1-65536 queued updates per connection
# heartbeat_interval = 25    # 1-300 seconds between pings
# idle_timeout = 60          # seconds; must exceed heartbeat_interval
# max_frame_bytes = 4096     # 64-1048576

[logging]
# level = "info"             # RUST_LOG overrides this

[stats]
# interval = 60              # seconds, 0 disables
"##
    .to_string()
}
