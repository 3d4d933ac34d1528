use citypulse_rs::{
    CityPulseError, GridPoint, HazardSnapshot, HeatmapAggregator, PathCell, PathPlanner,
    RouteOptions, Vote, now_unix,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), CityPulseError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let now = now_unix();
    let hazards = vec![
        HazardSnapshot::new(41_015_137, 28_979_530, 4)
            .with_id(1)
            .with_votes(vec![Vote::up(now - 3_600.0); 8])
            .with_last_activity(now - 3_600.0),
        HazardSnapshot::new(41_015_600, 28_979_900, 2)
            .with_id(2)
            .with_votes(vec![Vote::up(now), Vote::down(now)])
            .with_last_activity(now),
        HazardSnapshot::new(41_016_400, 28_980_100, 5)
            .with_id(3)
            .with_votes(vec![Vote::up(now - 86_400.0).with_trust(2.0); 3])
            .with_last_activity(now - 86_400.0),
    ];

    let aggregator = HeatmapAggregator::builder().grid_size_e6(900).build()?;
    for hazard in &hazards {
        info!(
            id = hazard.id,
            risk = hazard.risk_at(aggregator.scorer(), now),
            "scored hazard"
        );
    }

    let heatmap = aggregator.aggregate_at(&hazards, now);
    println!("Heatmap: {}", heatmap.to_json()?);

    let mut grid = vec![vec![PathCell::default(); 4]; 3];
    grid[0][1] = PathCell::new(75.0);
    grid[1][1] = PathCell::new(30.0).with_stairs();
    grid[2][2] = PathCell::new(0.0).with_ramp();

    let planner = PathPlanner::new(RouteOptions::default().wheelchair_mode(true))?;
    match planner.plan(&grid, GridPoint::new(0, 0), GridPoint::new(3, 0)) {
        Some(route) => {
            let points: Vec<String> = route
                .points
                .iter()
                .map(|p| format!("({}, {})", p.x, p.y))
                .collect();
            println!("Route: {} (cost {:.2})", points.join(" -> "), route.total_cost);
        }
        None => println!("Route: none"),
    }

    Ok(())
}
