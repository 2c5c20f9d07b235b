use neonswap_relay::infrastructure::config::Config;
use std::env;

fn main() -> anyhow::Result<()> {
    println!("Resolving NeonSwap Relay configuration...");

    let config = Config::new()?;
    println!("✅ Configuration is valid:");
    println!();
    println!("{}", serde_json::to_string_pretty(&config.summary())?);
    println!();

    let registry = config.token_registry()?;
    for token in registry.tokens() {
        println!("  {:<6} {:?} ({} decimals)", token.symbol.as_str(), token.address, token.decimals);
    }
    for (index, endpoint) in config.rpc_endpoints.iter().enumerate() {
        println!("  RPC {index}: {} -> {}", endpoint.label, endpoint.url);
    }

    // `show_config --save config.json` writes a starting point for CONFIG_FILE
    let args: Vec<String> = env::args().collect();
    if let Some(pos) = args.iter().position(|a| a == "--save") {
        let path = args.get(pos + 1).map(String::as_str).unwrap_or("config.json");
        config.save_to_file(path)?;
        println!();
        println!("💾 Saved to {path} (wallet key omitted)");
    }

    Ok(())
}
