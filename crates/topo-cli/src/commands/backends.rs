//! Compiled-in engine listing

use topo_algo::MilpBackend;

pub fn handle() {
    let default = MilpBackend::default();
    for name in MilpBackend::available() {
        let marker = if *name == default.as_str() { " (default)" } else { "" };
        println!("{}{}", name, marker);
    }
}
