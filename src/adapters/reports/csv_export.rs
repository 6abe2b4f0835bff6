//! Transcript CSV rendering for the external report consumer.
//!
//! Column set: course, credit, score, type, semester — approved grades
//! only, already ordered by semester by the store query.

use crate::domain::TranscriptRow;

pub fn transcript_to_csv(rows: &[TranscriptRow]) -> Result<String, csv::Error> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(["course", "credit", "score", "type", "semester"])?;
    for row in rows {
        wtr.write_record([
            row.course_name.as_str(),
            &row.credit.to_string(),
            &row.score.to_string(),
            row.kind.as_str(),
            row.semester.as_str(),
        ])?;
    }
    wtr.flush()?;

    let bytes = wtr.into_inner().map_err(|e| {
        csv::Error::from(std::io::Error::other(e.to_string()))
    })?;
    String::from_utf8(bytes).map_err(|e| {
        csv::Error::from(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            e.to_string(),
        ))
    })
}
