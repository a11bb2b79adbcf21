//! CLI command implementations.

pub mod inpaint;
