use gridsim_navigation::{find_path_detailed, DiscretePoint, PassabilityMap};
use std::collections::HashSet;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Create a 10x10 map
    let mut map = PassabilityMap::new(10, 10)?;

    let obstacles = vec![
        (1, 1), (2, 1), (7, 1), (8, 1),
        (4, 2),
        (2, 3), (3, 3), (4, 3), (5, 3), (7, 3),
        (5, 4), (7, 4),
        (1, 5), (2, 5), (3, 5), (5, 5), (7, 5), (8, 5),
        (3, 6),
        (1, 7), (3, 7), (5, 7), (6, 7), (7, 7),
        (1, 8), (8, 8),
        (3, 9), (4, 9), (5, 9),
    ];

    for (x, y) in obstacles {
        map.set(&DiscretePoint::new(x, y), false)?;
    }

    let start = DiscretePoint::new(0, 0);
    let goal = DiscretePoint::new(9, 9);

    println!("Map:");
    print_map(&map, start, goal, None);
    println!("\nStart: {}", start);
    println!("Goal: {}", goal);

    match find_path_detailed(start, goal, &map) {
        Ok(result) => {
            println!("\n{}", result);
            let path_set: HashSet<DiscretePoint> = result.path.iter().copied().collect();
            println!("\nMap with path:");
            print_map(&map, start, goal, Some(&path_set));
        }
        Err(e) => println!("\n{}", e),
    }

    Ok(())
}

fn print_map(
    map: &PassabilityMap,
    start: DiscretePoint,
    goal: DiscretePoint,
    path: Option<&HashSet<DiscretePoint>>,
) {
    // Print from top to bottom (reverse y order for visual clarity)
    for y in (0..map.height() as i32).rev() {
        print!("{} ", y);
        for x in 0..map.width() as i32 {
            let point = DiscretePoint::new(x, y);
            let glyph = if point == start {
                'S'
            } else if point == goal {
                'G'
            } else if path.is_some_and(|set| set.contains(&point)) {
                '*'
            } else if map.is_passable(&point) {
                '.'
            } else {
                'X'
            };
            print!("{} ", glyph);
        }
        println!();
    }

    print!("  ");
    for x in 0..map.width() {
        print!("{} ", x);
    }
    println!();
}
