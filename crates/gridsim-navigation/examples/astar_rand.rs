use gridsim_navigation::{find_path_detailed, DiscretePoint, PassabilityMap};
use rand::Rng;

const WIDTH: usize = 24;
const HEIGHT: usize = 12;
const OBSTACLE_DENSITY: f64 = 0.25;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = rand::rng();
    let mut map = PassabilityMap::new(WIDTH, HEIGHT)?;

    let start = DiscretePoint::new(0, 0);
    let goal = DiscretePoint::new(WIDTH as i32 - 1, HEIGHT as i32 - 1);

    for y in 0..HEIGHT as i32 {
        for x in 0..WIDTH as i32 {
            let point = DiscretePoint::new(x, y);
            if point != start && point != goal && rng.random_bool(OBSTACLE_DENSITY) {
                map.set(&point, false)?;
            }
        }
    }

    println!("{}\n", map);
    match find_path_detailed(start, goal, &map) {
        Ok(result) => {
            for point in &result.path {
                map.set(point, false)?;
            }
            println!("{}", result);
            println!("Route (drawn as blocked cells):\n{}", map);
        }
        Err(e) => println!("{}", e),
    }
    Ok(())
}
