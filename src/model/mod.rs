// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Value model for expression evaluation
//!
//! Values are a closed tagged union; host data enters either as maps and
//! lists or as [`HostObject`] implementations.

pub mod fragment;
pub mod host;
pub mod locale;
pub mod number;
pub mod value;

pub use fragment::Fragment;
pub use host::{HostObject, Navigation};
pub use locale::Locale;
pub use number::Numeric;
pub use value::{Value, ValueMap};
