//! Event container for scrub.
//!
//! A container is a JSON Lines file. The first line is a header:
//!
//! ```json
//! {"format":"scrub-events","version":1,"metadata":{"source":"app.jfr"}}
//! ```
//!
//! Every following non-empty line is one [`Event`].
//!
//! # Example
//!
//! ```no_run
//! use scrub_container::{ContainerHeader, Event, EventReader, EventWriter};
//! use std::path::Path;
//!
//! let mut writer = EventWriter::create(Path::new("out.jsonl"), &ContainerHeader::new()).unwrap();
//! writer.write(&Event::new("jdk.ThreadStart").with_thread("main")).unwrap();
//! writer.finish().unwrap();
//!
//! for event in EventReader::open(Path::new("out.jsonl")).unwrap() {
//!     println!("{}", event.unwrap().type_name);
//! }
//! ```

pub mod error;
pub mod event;
pub mod header;
pub mod reader;
pub mod writer;

pub use error::{ContainerError, Result};
pub use event::{Event, Field, StackFrame, StackTrace, ThreadRef, TypedValue};
pub use header::{ContainerHeader, FORMAT_NAME, FORMAT_VERSION};
pub use reader::{read_events, EventReader};
pub use writer::{write_events, EventWriter};
