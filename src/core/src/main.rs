use log::{error, info};
use rtcgate::configuration::config::Config;
use rtcgate::controller::controller_handler::Controller;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .init();

    println!(
        "
==============================================================================
          rtcgate v0.1.0 - channel tokens and cloud-recording proxy
==============================================================================
"
    );

    info!("Importing configuration");

    let config = match Config::from_args() {
        Ok(config) => config,
        Err(e) => {
            error!("Unable to import configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!("Configuration imported successfully");

    let controller = match Controller::new(config) {
        Ok(controller) => controller,
        Err(e) => {
            error!("Unable to create a controller instance: {}, exiting...", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = controller.run().await {
        error!("Error occured in the controller process: {}, exiting...", e);
        std::process::exit(1);
    }
}
