use gridsim_pose::*;

fn main() {
    let mut pose = Pose::new(1.0, 1.0, 0.0);
    println!("Initial pose:   {}", pose);
    println!("  updates:      {:?}", pose.updates());

    // A renderer would read the flags here, then clear them once per tick.
    pose.reset_updates();
    println!("After reset:    any_updated = {}", pose.any_updated());

    // Step one cell up and face north; only y and theta should be reported.
    let step = Pose::new(0.0, 1.0, 0.0);
    let mut target = pose + step;
    target.set_theta(90.0);
    pose.set_to(&target);
    println!("After step:     {}", pose);
    println!("  updates:      {:?}", pose.updates());
    println!("  grid cell:    {}", pose.as_discrete_point());

    let scaled = pose * Pose::with_size(1.0, 1.0, 1.0, 2.0, 0.5);
    println!("Scaled sprite:  {}", scaled);
}
