// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

#[cfg(test)]
mod tests {
    use netwatch::utils::telemetry;

    #[test]
    fn test_telemetry_initialization() {
        telemetry::init_telemetry();

        tracing::trace!("This is a trace message");
        tracing::debug!("This is a debug message");
        tracing::info!("This is an info message");
        tracing::warn!("This is a warning message");

        tracing::info!(
            task_id = 42,
            generation_id = 7,
            access_type = "ping",
            "Execution finished"
        );

        let error_result: Result<(), &str> = Err("Host unreachable");
        if let Err(e) = error_result {
            tracing::error!(error = e, "Execution failed");
        }
    }
}
