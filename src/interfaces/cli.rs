use clap::Parser;

#[derive(Parser)]
#[command(name = "dishq")]
#[command(about = "Find out what's in a dish at any restaurant.")]
#[command(version)]
pub struct Cli {
    /// Dish to look up, e.g. "Caesar Salad"
    pub dish: Option<String>,

    /// Restaurant name, e.g. "Joe's Diner"
    pub restaurant: Option<String>,

    /// Place-provider id for the restaurant, if known
    #[arg(short = 'p', long)]
    pub provider_id: Option<String>,

    /// Don't use cached result
    #[arg(short = 'n', long)]
    pub nocache: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Choose color theme
    #[arg(short = 'T', long)]
    pub theme: Option<String>,

    /// Generate config sample
    #[arg(long)]
    pub generate_config: bool,

    /// Show status
    #[arg(long)]
    pub status: bool,
}
