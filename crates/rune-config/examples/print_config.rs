/// Example program to print the loaded configuration
///
/// Run with: cargo run -p rune-config --example print_config

fn main() {
    let config = rune_config::RuneConfig::load();

    println!("=== Rune Animation Configuration ===\n");

    println!("Timing Settings:");
    println!("  Max FPS: {}", config.timing.max_fps);
    println!("  Effective FPS: {}", config.timing.effective_fps());
    println!("  Manual Time Source: {}", config.timing.manual_time_source);
    println!("  Event Queue Capacity: {}", config.timing.event_queue_capacity);
    println!();

    println!("Logging Settings:");
    println!("  Filter: {}", config.logging.filter);
    println!();

    println!("Demo Settings:");
    println!("  Duration: {} ms", config.demo.duration_ms);
    println!();

    match toml::to_string_pretty(&config) {
        Ok(toml_str) => {
            println!("=== Serialized Configuration ===");
            println!("{}", toml_str);
        }
        Err(e) => {
            eprintln!("Failed to serialize config: {}", e);
        }
    }
}
