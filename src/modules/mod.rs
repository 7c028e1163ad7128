// Module exports
pub mod navigation;         // URL bar logic (pure)
pub mod tabs;               // Tab bookkeeping (pure)
pub mod downloads;          // Download policy + transfer
pub mod files;              // Page open/save
pub mod settings_dialog;    // Settings window commands
