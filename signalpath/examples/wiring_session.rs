//! Wiring example: place two parts, wire them and print the routed result.

use signalpath::prelude::*;

fn main() -> Result<(), SchematicError> {
    let mut session = EditorSession::default();
    session.subscribe(|event| println!("  event: {:?}", event));

    let r1 = session.place_component("resistor", Point::new(100.0, 100.0))?;
    let u1 = session.place_component("opamp", Point::new(300.0, 100.0))?;

    session.click_pin(PinRef::new(&r1, "2"))?;
    session.click_pin(PinRef::new(&u1, "in_pos"))?;
    println!("Status: {}", session.status_message().unwrap_or(""));

    // A second wire from the same pin is refused
    if let Err(e) = session.click_pin(PinRef::new(&r1, "2")) {
        println!("Rejected: {}", e);
    }

    for wire in session.routed_wires() {
        let path: Vec<String> = wire
            .points
            .iter()
            .map(|p| format!("({}, {})", p.x, p.y))
            .collect();
        println!("Net {}: {}", wire.net_id, path.join(" -> "));
    }

    session.undo();
    println!("After undo: {} nets", session.net_count());
    Ok(())
}
