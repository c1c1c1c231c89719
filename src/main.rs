use leadboard::cli::run;
use leadboard::service::ServiceError;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("LEADBOARD_LOG", "warn")).init();

    // No-op outside Windows consoles
    if enable_ansi_support::enable_ansi_support().is_err() {
        log::debug!("ANSI colour support unavailable on this console");
    }

    if let Err(e) = run() {
        // Failures reported by (or on the way to) the lead service
        let is_service_error = e.chain().any(|cause| cause.downcast_ref::<ServiceError>().is_some());
        if is_service_error {
            eprintln!("Service error: {}", e);
            // Show error chain if available
            let mut source = e.source();
            if source.is_some() {
                eprintln!("\nCaused by:");
                let mut indent = 1;
                while let Some(err) = source {
                    eprintln!("{:indent$}  {}", "", err);
                    source = err.source();
                    indent += 1;
                }
            }
            std::process::exit(2);
        } else {
            // User error
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
