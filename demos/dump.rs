// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dumps a small configuration with and without f-string interpolation.
//!
//! Run with:
//!
//! ```text
//! cargo run --example dump
//! ```

use interpcfg::adapters::DEFAULT_SECTION;
use interpcfg::prelude::*;

const SETTINGS: &[(&str, &[(&str, &str)])] = &[
    (DEFAULT_SECTION, &[("value", "77.1230")]),
    (
        "fstring",
        &[
            ("value1", "{value}"),
            ("value2", "two_{value}"),
            ("value3", "three_{value2}"),
            ("value_raw", "{value!r}"),
            ("value_int", "{int(float(value))}"),
        ],
    ),
    (
        "basic",
        &[("value2", "two_%(value)s"), ("value3", "three_%(value2)s")],
    ),
];

fn load(interpolation: impl Interpolation + 'static) -> Result<SectionedConfig> {
    let mut config = SectionedConfig::new(interpolation);
    for (section, options) in SETTINGS {
        if *section != DEFAULT_SECTION {
            config.add_section(section)?;
        }
        for (option, value) in *options {
            config.set(section, option, value)?;
        }
    }
    Ok(config)
}

fn dump(title: &str, config: &SectionedConfig) -> Result<()> {
    println!("# {}", title);
    for section in config.sections() {
        println!("[{}]", section);
        for option in config.options(section)? {
            match config.get(section, option) {
                Ok(value) => println!("{} = {}", option, value),
                Err(e) => println!("{} !! {}", option, e),
            }
        }
        println!();
    }
    Ok(())
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    dump("no interpolation", &load(NoInterpolation)?)?;
    dump("f-string interpolation", &load(FStringInterpolation::new())?)?;
    Ok(())
}
