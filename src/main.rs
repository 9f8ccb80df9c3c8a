use clap::Parser;
use site_harvest::lambda_handler;

mod args;
use args::Args;

#[tokio::main]
async fn main() {
    // Initialize logging, defaulting to info
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Parse command-line arguments
    let args = Args::parse();

    let event = match args.to_event() {
        Ok(event) => event,
        Err(e) => {
            ::log::error!("Invalid invocation event: {}", e);
            std::process::exit(2);
        }
    };

    let start_time = std::time::Instant::now();
    let response = lambda_handler(event).await;
    ::log::info!(
        "Invocation finished with status {} in {:.2} seconds",
        response.status_code,
        start_time.elapsed().as_secs_f64()
    );

    match serde_json::to_string_pretty(&response) {
        Ok(json) => println!("{}", json),
        Err(e) => ::log::error!("Could not serialize response: {}", e),
    }

    if response.status_code != 200 {
        std::process::exit(1);
    }
}
