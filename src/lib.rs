/// Tube Digest - AI summaries inside YouTube's transcript panel
/// Built with Rust + WASM

mod config;
mod error;
mod extract;
mod host;
mod pipeline;
mod presence;
mod provider;
mod render;
mod session;
mod signals;
mod storage;
mod supervisor;
pub mod ui;

use std::cell::RefCell;

use log::info;
use wasm_bindgen::prelude::*;

use crate::host::HostPage;
use crate::signals::SignalBus;
use crate::supervisor::Supervisor;

// The supervisor and its signal sources must live for the page's lifetime.
thread_local! {
    static RUNTIME: RefCell<Option<(Supervisor, SignalBus)>> = const { RefCell::new(None) };
}

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

/// Content-script entry point. Wires every change signal to the supervisor
/// and runs the first recheck.
#[wasm_bindgen]
pub fn start_content_script() -> Result<(), JsValue> {
    let host = HostPage::new();
    if !host.on_youtube() {
        info!("not a YouTube page, staying idle");
        return Ok(());
    }

    let supervisor = Supervisor::new();
    let bus = {
        let supervisor = supervisor.clone();
        SignalBus::install(move |signal| supervisor.handle(signal))?
    };

    supervisor.handle(signals::Signal::Navigated(None));
    RUNTIME.with(|runtime| *runtime.borrow_mut() = Some((supervisor, bus)));
    info!("content script started");
    Ok(())
}
