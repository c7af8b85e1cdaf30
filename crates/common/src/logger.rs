use tracing_subscriber::EnvFilter;

pub fn setup_logger() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("debug"))
        .add_directive("hyper=warn".parse().expect("valid directive"))
        .add_directive("reqwest=warn".parse().expect("valid directive"));

    tracing_subscriber::fmt()
        // .with_file(true)
        // .with_line_number(true)
        .with_target(true)
        .with_level(true)
        .with_ansi(true)
        .compact()
        .with_env_filter(filter)
        .init();
}
