// UI module - Slint window and the timer-driven poll loop
//
// This module contains:
// - GuiController: wires the window's trigger to run launches and polls each run
//   from the Slint event loop without ever blocking it

pub mod controller;

pub use controller::GuiController;
