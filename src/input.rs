use crate::data::{Catalog, Subject};
use log::debug;
use std::io::{BufRead, Write};

fn prompt<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
) -> Result<String, String> {
    write!(output, "{}", question).map_err(|e| e.to_string())?;
    output.flush().map_err(|e| e.to_string())?;

    let mut line = String::new();
    let read = input.read_line(&mut line).map_err(|e| e.to_string())?;
    if read == 0 {
        return Err(format!("Input ended while waiting for: {}", question.trim()));
    }
    Ok(line.trim().to_string())
}

fn prompt_count<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
) -> Result<u32, String> {
    let answer = prompt(input, output, question)?;
    answer
        .parse::<u32>()
        .map_err(|_| format!("Expected a non-negative number, got '{}'.", answer))
}

/// Prompts for one section's subjects. When `default_teachers` is given the
/// teacher question is skipped and the teacher at the same position is used.
pub fn read_catalog<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    section_name: &str,
    default_teachers: Option<&[String]>,
) -> Result<Catalog, String> {
    writeln!(output, "\n[Input for {}]", section_name).map_err(|e| e.to_string())?;
    let count = prompt_count(input, output, &format!("How many subjects for {}: ", section_name))?;

    let mut subjects = Vec::new();
    for i in 0..count as usize {
        writeln!(output, "\nSubject {}:", i + 1).map_err(|e| e.to_string())?;
        let name = prompt(input, output, "  Subject name: ")?;
        let teacher = match default_teachers {
            Some(teachers) => teachers.get(i).cloned().ok_or_else(|| {
                format!("No teacher from the first section for subject {}.", i + 1)
            })?,
            None => prompt(input, output, "  Teacher name: ")?,
        };
        let weekly_classes = prompt_count(input, output, "  Number of classes per week: ")?;
        let weekly_labs = prompt_count(input, output, "  Number of labs per week: ")?;
        subjects.push(Subject::new(&name, &teacher, weekly_classes, weekly_labs));
    }

    let catalog = Catalog::new(subjects);
    catalog.validate()?;
    debug!("Read {} subjects for {}", catalog.len(), section_name);
    Ok(catalog)
}

/// Reads section A, then either reuses it for section B or prompts again
/// keeping section A's teachers by position.
pub fn read_sections<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
) -> Result<(Catalog, Catalog), String> {
    let section_a = read_catalog(input, output, "Section-A", None)?;
    if let Some(warning) = section_a.workload_warning() {
        writeln!(output, "Warning: {}", warning).map_err(|e| e.to_string())?;
    }

    let same = prompt(
        input,
        output,
        "\nInputs are same for Section-B also? (0 for yes, 1 for no): ",
    )?;
    let section_b = match same.as_str() {
        "0" => section_a.clone(),
        "1" => {
            let teachers = section_a.teachers();
            read_catalog(input, output, "Section-B", Some(teachers.as_slice()))?
        }
        other => return Err(format!("Expected 0 or 1, got '{}'.", other)),
    };
    Ok((section_a, section_b))
}
