use std::io::BufRead;

use tasksim::{Simulation, SimulationConfig};

fn wait_for_enter() {
    let mut line = String::new();
    if let Err(err) = std::io::stdin().lock().read_line(&mut line) {
        log::warn!("Failed to read from stdin: {err}");
    }
}

fn main() -> tasksim::Result<()> {
    tasksim::logging::init();

    let config = SimulationConfig::default();
    log::debug!("Using configuration {config:?}");

    let simulation = Simulation::new(config).start()?;

    println!("Сервер и клиенты запущены.");
    println!("Для завершения их работы нажмите Enter.");
    wait_for_enter();

    simulation.shutdown()?;

    println!("Готово.");
    wait_for_enter();

    Ok(())
}
