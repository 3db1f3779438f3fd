//! Providers command handler
//!
//! Lists the registered lookup providers and which fields use them.

use crate::config::Config;
use crate::error::Result;
use crate::geo::registry::ProviderRegistry;
use clap::Args;

/// Providers command arguments
#[derive(Args)]
pub struct ProvidersArgs {
    /// Also list configured fields and their lookup order
    #[arg(long)]
    pub fields: bool,
}

/// Run the providers command
pub fn run(args: ProvidersArgs, config: Config) -> Result<()> {
    let registry = ProviderRegistry::from_config(&config.providers);

    println!("Available lookup providers:");
    for provider in registry.available_providers() {
        println!("  {:14} - {}", provider.name, provider.description);
    }

    if args.fields {
        println!();
        if config.fields.is_empty() {
            println!("No fields configured");
        } else {
            println!("Fields:");
            for field in &config.fields {
                let services: Vec<String> = field
                    .lookup_services
                    .iter()
                    .map(|s| {
                        if registry.get(&s.service).is_some() {
                            s.service.clone()
                        } else {
                            format!("{} (unknown)", s.service)
                        }
                    })
                    .collect();
                let status = if field.is_configured() { "" } else { " [not configured]" };
                println!("  {}{}: {}", field.id, status, services.join(" -> "));
            }
        }
    }

    Ok(())
}
