// crates/pmc-rs-export/src/sym/writer.rs
//! PCAN symbol file (`.sym`) writer.

use std::fmt::Write;

use rust_decimal::Decimal;

use super::matrix::{
    DISPLAY_DECIMAL_PLACES, Direction, Frame, GEN_SIG_START_VALUE, HEXADECIMAL_OUTPUT, LONG_NAME, Matrix, Signal,
};

const SECTIONS: [(Direction, &str); 3] = [
    (Direction::Send, "{SEND}"),
    (Direction::Receive, "{RECEIVE}"),
    (Direction::SendReceive, "{SENDRECEIVE}"),
];

fn decimal(value: Decimal) -> String {
    value.normalize().to_string()
}

fn one_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn write_signal(out: &mut String, signal: &Signal) -> std::fmt::Result {
    write!(
        out,
        "Var={} {} {},{}",
        signal.name,
        if signal.signed { "signed" } else { "unsigned" },
        signal.start_bit,
        signal.bits
    )?;
    if let Some(unit) = signal.unit.as_deref().filter(|u| !u.is_empty()) {
        write!(out, " /u:{}", unit.replace(' ', "_"))?;
    }
    if signal.factor != Decimal::ONE {
        write!(out, " /f:{}", decimal(signal.factor))?;
    }
    if let Some(min) = signal.minimum {
        write!(out, " /min:{}", decimal(min))?;
    }
    if let Some(max) = signal.maximum {
        write!(out, " /max:{}", decimal(max))?;
    }
    if let Some(enumeration) = &signal.enumeration {
        write!(out, " /e:{enumeration}")?;
    }
    if let Some(places) = signal.attributes.get(DISPLAY_DECIMAL_PLACES) {
        write!(out, " /p:{places}")?;
    }
    if let Some(long_name) = signal.attributes.get(LONG_NAME).filter(|l| **l != signal.name) {
        write!(out, " /ln:\"{long_name}\"")?;
    }
    if let Some(start) = signal.attributes.get(GEN_SIG_START_VALUE) {
        write!(out, " /d:{start}")?;
    }
    if signal.attributes.get(HEXADECIMAL_OUTPUT).is_some_and(|h| h == "1") {
        out.push_str(" -h");
    }
    if let Some(comment) = signal.comment.as_deref().filter(|c| !c.is_empty()) {
        write!(out, "\t// {}", one_line(comment))?;
    }
    out.push('\n');
    Ok(())
}

fn write_frame(out: &mut String, frame: &Frame) -> std::fmt::Result {
    writeln!(out, "[{}]", frame.name)?;
    write!(out, "ID={:03X}h", frame.id)?;
    if let Some(comment) = frame.comment.as_deref().filter(|c| !c.is_empty()) {
        write!(out, "\t// {}", one_line(comment))?;
    }
    out.push('\n');
    if frame.extended {
        writeln!(out, "Type=Extended")?;
    }
    writeln!(out, "DLC={}", frame.length)?;
    if let Some(cycle) = frame.cycle_time() {
        writeln!(out, "CycleTime={cycle}")?;
    }

    match &frame.selector {
        Some(selector) if !frame.muxes.is_empty() => {
            for (i, mux) in frame.muxes.iter().enumerate() {
                if i > 0 {
                    writeln!(out, "[{}]", frame.name)?;
                    writeln!(out, "DLC={}", mux.length)?;
                }
                write!(
                    out,
                    "Mux={} {},{} {:X}h",
                    mux.name, selector.start_bit, selector.bits, mux.value
                )?;
                if let Some(comment) = mux.comment.as_deref().filter(|c| !c.is_empty()) {
                    write!(out, "\t// {}", one_line(comment))?;
                }
                out.push('\n');
                for signal in frame.signals.iter().chain(&mux.signals) {
                    write_signal(out, signal)?;
                }
            }
        }
        _ => {
            for signal in &frame.signals {
                write_signal(out, signal)?;
            }
        }
    }
    Ok(())
}

/// Renders `matrix` as a PCAN symbol file.
pub fn write_sym(matrix: &Matrix) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    writeln!(out, "FormatVersion=5.0 // Do not edit this line!")?;
    writeln!(out, "Title=\"{}\"", matrix.title)?;

    if !matrix.enums.is_empty() {
        writeln!(out)?;
        writeln!(out, "{{ENUMS}}")?;
        for (name, values) in &matrix.enums {
            let values: Vec<String> = values.iter().map(|(v, n)| format!("{v}=\"{n}\"")).collect();
            writeln!(out, "enum {name}({})", values.join(", "))?;
        }
    }

    for (direction, header) in SECTIONS {
        let frames: Vec<&Frame> = matrix.frames.iter().filter(|f| f.direction == direction).collect();
        if frames.is_empty() {
            continue;
        }
        writeln!(out)?;
        writeln!(out, "{header}")?;
        for frame in frames {
            writeln!(out)?;
            write_frame(&mut out, frame)?;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sym::matrix::{GEN_MSG_CYCLE_TIME, Mux, Selector};
    use rust_decimal::Decimal;

    fn signal(name: &str, start_bit: i64, bits: i64) -> Signal {
        Signal {
            name: name.into(),
            start_bit,
            bits,
            ..Default::default()
        }
    }

    #[test]
    fn plain_frame() {
        let mut temp = signal("Temp", 0, 16);
        temp.factor = Decimal::new(1, 1);
        temp.unit = Some("degC".into());
        temp.comment = Some("Heat sink\ntemperature <factory>".into());
        temp.attributes.insert(LONG_NAME, "HeatSinkTemperature".into());
        let mut attributes = std::collections::BTreeMap::new();
        attributes.insert(GEN_MSG_CYCLE_TIME, "100".into());
        let matrix = Matrix {
            title: "pmc".into(),
            frames: vec![Frame {
                name: "Status".into(),
                id: 0x10,
                length: 2,
                direction: Direction::Send,
                attributes,
                signals: vec![temp],
                ..Default::default()
            }],
            ..Default::default()
        };
        let text = write_sym(&matrix).expect("write");
        assert_eq!(
            text,
            "FormatVersion=5.0 // Do not edit this line!\nTitle=\"pmc\"\n\n{SEND}\n\n[Status]\nID=010h\nDLC=2\n\
             CycleTime=100\nVar=Temp unsigned 0,16 /u:degC /f:0.1 /ln:\"HeatSinkTemperature\"\t\
             // Heat sink temperature <factory>\n"
        );
    }

    #[test]
    fn multiplexed_frame_repeats_its_header() {
        let matrix = Matrix {
            title: "pmc".into(),
            frames: vec![Frame {
                name: "Table".into(),
                id: 0x1FF,
                extended: true,
                length: 8,
                selector: Some(Selector {
                    name: "Mux".into(),
                    start_bit: 0,
                    bits: 8,
                }),
                muxes: vec![
                    Mux {
                        name: "A".into(),
                        value: 1,
                        length: 8,
                        signals: vec![signal("a", 8, 8)],
                        ..Default::default()
                    },
                    Mux {
                        name: "B".into(),
                        value: 0x1A,
                        length: 8,
                        signals: vec![signal("b", 8, 16)],
                        ..Default::default()
                    },
                ],
                ..Default::default()
            }],
            ..Default::default()
        };
        let text = write_sym(&matrix).expect("write");
        assert!(text.contains(
            "{SENDRECEIVE}\n\n[Table]\nID=1FFh\nType=Extended\nDLC=8\nMux=A 0,8 1h\nVar=a unsigned 8,8\n\
             [Table]\nDLC=8\nMux=B 0,8 1Ah\nVar=b unsigned 8,16\n"
        ));
    }

    #[test]
    fn enums_are_listed_first() {
        let mut matrix = Matrix {
            title: "pmc".into(),
            ..Default::default()
        };
        matrix
            .enums
            .insert("Curve".into(), vec![(0, "Low".into()), (1, "High".into())]);
        let text = write_sym(&matrix).expect("write");
        assert!(text.ends_with("{ENUMS}\nenum Curve(0=\"Low\", 1=\"High\")\n"));
    }
}
