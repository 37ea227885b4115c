//! Basic GridOT Example
//!
//! Two replicas edit the same grid concurrently: one inserts a row above a
//! cell the other is writing. Both end up with the same grid once each has
//! applied the other's operation, transformed.
//!
//! Run with: cargo run --example basic

use gridot_core::{apply, create, invert, transform, Operation, SetCell, Side, Snapshot};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("GridOT Basic Example\n");

    let base = Snapshot::from_rows(vec![
        vec!["name".into(), "qty".into()],
        vec!["apples".into(), 3i64.into()],
    ]);
    print_grid("Base", &base);

    // Alice inserts a header row; Bob bumps the apple count
    let alice = Operation::insert_rows(0, 1);
    let bob = Operation::set([SetCell::new(1, 1, 3i64, 4i64)]);

    // The authority commits Alice first, so Bob's op is rebased onto hers
    let mut at_alice = create(Some(&base));
    apply(&mut at_alice, &alice)?;
    apply(&mut at_alice, &transform(&bob, &alice, Side::Right))?;

    let mut at_bob = create(Some(&base));
    apply(&mut at_bob, &bob)?;
    apply(&mut at_bob, &transform(&alice, &bob, Side::Left))?;

    print_grid("Alice", &at_alice);
    print_grid("Bob", &at_bob);
    println!("Converged: {}\n", at_alice == at_bob);

    // Undo Bob's write on the converged grid
    let bob_rebased = transform(&bob, &alice, Side::Right);
    apply(&mut at_alice, &invert(&bob_rebased))?;
    print_grid("After undo", &at_alice);

    println!("Wire form: {}", serde_json::to_string(&bob_rebased)?);

    Ok(())
}

fn print_grid(label: &str, grid: &Snapshot) {
    println!("{}:", label);
    for row in grid.rows() {
        let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
        println!("  | {} |", cells.join(" | "));
    }
}
