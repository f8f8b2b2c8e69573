use wayfinder_engine::Exploration;

const DEMO_EXPLORATION_RAW: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/assets/demo.json"));

/// The exploration played by `--demo`.
pub fn demo_exploration() -> Result<Exploration, serde_json::Error> {
    serde_json::from_str(DEMO_EXPLORATION_RAW)
}
