mod validation_vm;

pub use validation_vm::{
    FlipSlotVm, ValidationIntent, ValidationOutcome, ValidationVm, start_validation,
};
