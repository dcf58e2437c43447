//! Interactive mapping-session explorer: author demonstrations, move
//! them, query the blend, and watch the update log — all on the
//! observed live configuration (2-D gestures, six parameters).

use demo_field::{DemoId, DestVec, SourceVec};
use field_session::GestureSession;
use sphere_blend::{BlendKind, InverseDistance, Strategy};
use std::io::{self, Write};

fn main() {
    tracing_subscriber::fmt().with_target(false).init();

    println!();
    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║          Demonstration Field Mapping Explorer            ║");
    println!("║        2-D gesture space → 6 synthesis parameters        ║");
    println!("╚══════════════════════════════════════════════════════════╝");
    println!();

    let mut session = GestureSession::new();

    loop {
        print_menu();
        let choice = read_line("Command: ").trim().to_ascii_lowercase();

        match choice.as_str() {
            "1" => add_demo(&mut session),
            "2" => move_source(&mut session),
            "3" => edit_destination(&mut session),
            "4" => remove_demo(&mut session),
            "5" => query(&mut session),
            "6" => project(&session),
            "7" => switch_strategy(&mut session),
            "8" => {
                let dt: u64 = read_line("  Advance by (time units): ").trim().parse().unwrap_or(1);
                session.advance(dt);
                println!("  Clock now at t={}.", session.now());
            }
            "9" => drain(&mut session),
            "s" => println!("  {}", session.status()),
            "w" => {
                let path = read_line("  Save to file: ").trim().to_string();
                session.flush_updates();
                match session.save_file(&path) {
                    Ok(())  => println!("  Saved {} demos to {}.", session.len(), path),
                    Err(e)  => println!("  ⚠  Save failed: {}", e),
                }
            }
            "l" => {
                let path = read_line("  Load from file: ").trim().to_string();
                match GestureSession::load_file(&path) {
                    Ok(s)  => {
                        println!("  Loaded {} demos from {}.", s.len(), path);
                        session = s;
                    }
                    Err(e) => println!("  ⚠  Load failed: {}", e),
                }
            }
            "q" | "quit" => {
                println!("\nGoodbye!\n");
                break;
            }
            _ => println!("  ⚠  Unknown command."),
        }
        println!();
    }
}

fn print_menu() {
    println!("  ┌─────────────────────────────────────────────────────────┐");
    println!("  │  1. Add demonstration       6. Project demos (views)    │");
    println!("  │  2. Move source             7. Switch strategy          │");
    println!("  │  3. Edit destination        8. Advance clock            │");
    println!("  │  4. Remove demonstration    9. Drain update log         │");
    println!("  │  5. Query a gesture point                               │");
    println!("  │  s. Status   w. Save   l. Load   q. Quit                │");
    println!("  └─────────────────────────────────────────────────────────┘");
}

// ── commands ─────────────────────────────────────────────────────────────────

fn add_demo(session: &mut GestureSession) {
    let Some(source) = read_source() else { return };
    let Some(destination) = read_destination() else { return };
    let id = session.insert(source, destination);
    println!("  Added demonstration {} ({} total).", id, session.len());
}

fn move_source(session: &mut GestureSession) {
    let Some(id) = pick_demo(session) else { return };
    let Some(source) = read_source() else { return };
    match session.update_source(id, source) {
        Ok(())  => println!("  Moved {}.", id),
        Err(e)  => println!("  ⚠  {}", e),
    }
}

fn edit_destination(session: &mut GestureSession) {
    let Some(id) = pick_demo(session) else { return };
    let Some(destination) = read_destination() else { return };
    match session.update_destination(id, destination) {
        Ok(())  => println!("  Updated {}.", id),
        Err(e)  => println!("  ⚠  {}", e),
    }
}

fn remove_demo(session: &mut GestureSession) {
    let Some(id) = pick_demo(session) else { return };
    match session.remove(id) {
        Ok(())  => println!("  Removed {} ({} left).", id, session.len()),
        Err(e)  => println!("  ⚠  {}", e),
    }
}

fn query(session: &mut GestureSession) {
    let Some(q) = read_source() else { return };
    let out = session.query(&q);
    match out.kind {
        BlendKind::Empty     => println!("  No demonstrations yet — zero estimate."),
        BlendKind::Uncovered => println!("  No demo covers this point — zero-vector fallback."),
        BlendKind::Exact     => println!("  Query sits on a demonstration:"),
        BlendKind::Weighted  => println!("  Weighted blend:"),
    }
    println!("  estimate = {:?}", out.estimate.as_slice());
    for w in &out.weights {
        println!(
            "    {}  distance={:<8.4} radius={:<8.4} weight={:.4}",
            w.id, w.distance, w.radius, w.weight
        );
    }
}

fn project(session: &GestureSession) {
    if session.is_empty() {
        println!("  No demonstrations to project.");
        return;
    }
    println!("  2-D source view        reduced destination view");
    for &id in session.field().ids() {
        let (Ok(sv), Ok(dv)) = (session.project_source(id), session.project_destination(id))
        else { continue };
        println!(
            "  {}  ({:>7.3}, {:>7.3})   ({:>7.3}, {:>7.3}, {:>7.3})",
            id, sv[0], sv[1], dv[0], dv[1], dv[2]
        );
    }
}

fn switch_strategy(session: &mut GestureSession) {
    println!("  1. Intersecting Spheres (primary)");
    println!("  2. Inverse Distance (choose power)");
    match read_line("  Strategy: ").trim() {
        "1" => {
            session.set_strategy(Strategy::IntersectingSpheres);
            println!("  Now using Intersecting Spheres.");
        }
        "2" => {
            let power: f64 = read_line("  Power (default 8): ").trim().parse().unwrap_or(8.0);
            session.set_strategy(Strategy::InverseDistance(InverseDistance::new().power(power)));
            println!("  Now using Inverse Distance, power {}.", power);
        }
        _ => println!("  ⚠  Please enter 1 or 2."),
    }
}

fn drain(session: &mut GestureSession) {
    session.flush_updates();
    let records = session.drain_updates();
    if records.is_empty() {
        println!("  Update log is empty.");
        return;
    }
    for r in &records {
        println!(
            "  t={:<6} {:<12} {}  s={:?} d={:?}",
            r.at,
            r.event.tag(),
            r.event.id(),
            r.source.as_slice(),
            r.destination.as_slice()
        );
    }
    println!("  ({} record(s) drained)", records.len());
}

// ── input helpers ────────────────────────────────────────────────────────────

fn pick_demo(session: &GestureSession) -> Option<DemoId> {
    if session.is_empty() {
        println!("  No demonstrations yet.");
        return None;
    }
    for (i, demo) in session.field().iter().enumerate() {
        println!(
            "    {}. {}  s={:?}",
            i + 1,
            demo.id,
            demo.source.as_slice()
        );
    }
    let n: usize = read_line("  Which demonstration? ").trim().parse().ok()?;
    let id = *session.field().ids().get(n.checked_sub(1)?)?;
    Some(id)
}

fn read_source() -> Option<SourceVec<2>> {
    let comps = read_floats("  Gesture point (2 numbers): ", 2)?;
    Some(SourceVec::from([comps[0], comps[1]]))
}

fn read_destination() -> Option<DestVec<6>> {
    let comps = read_floats("  Parameters (6 numbers): ", 6)?;
    Some(DestVec::from([
        comps[0], comps[1], comps[2], comps[3], comps[4], comps[5],
    ]))
}

fn read_floats(prompt: &str, n: usize) -> Option<Vec<f64>> {
    let line = read_line(prompt);
    let comps: Vec<f64> = line
        .split_whitespace()
        .filter_map(|t| t.parse().ok())
        .collect();
    if comps.len() != n {
        println!("  ⚠  Expected {} numbers.", n);
        return None;
    }
    Some(comps)
}

fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    io::stdout().flush().ok();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf
}
