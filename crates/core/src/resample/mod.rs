use crate::{Record, Result, SyncError};

/// Integer ratio between `target_hz` and `source_hz`.
pub fn upsample_factor(source_hz: u32, target_hz: u32) -> Result<usize> {
    if source_hz == 0 || target_hz == 0 {
        return Err(SyncError::configuration(format!(
            "sample rates must be positive (got {source_hz} Hz -> {target_hz} Hz)"
        )));
    }
    if target_hz < source_hz || target_hz % source_hz != 0 {
        return Err(SyncError::configuration(format!(
            "{target_hz} Hz is not an integer multiple of {source_hz} Hz"
        )));
    }
    Ok((target_hz / source_hz) as usize)
}

/// Brings a record sampled at `source_hz` up to `target_hz` by repeating each
/// row. Placeholder rows must already have been stripped by the loader.
pub fn upsample(record: &Record, source_hz: u32, target_hz: u32) -> Result<Record> {
    let factor = upsample_factor(source_hz, target_hz)?;
    tracing::debug!(
        rows = record.len(),
        factor,
        "upsampling {source_hz} Hz record to {target_hz} Hz"
    );
    Ok(record.repeat_rows(factor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChannelSeries;

    #[test]
    fn repeats_each_sample_by_the_rate_ratio() {
        let input = vec![0.1, f64::NAN, 0.3, 0.4, 0.5, 0.6, 0.7];
        let record =
            Record::from_channels(vec![ChannelSeries::new("left_x", input.clone())]).unwrap();

        let output = upsample(&record, 60, 300).unwrap();
        let samples = output.channel("left_x").unwrap().samples();

        assert_eq!(output.len(), input.len() * 5);
        for (i, value) in samples.iter().enumerate() {
            let expected = input[i / 5];
            assert!(value == &expected || (value.is_nan() && expected.is_nan()));
        }
    }

    #[test]
    fn identical_rates_are_a_copy() {
        assert_eq!(upsample_factor(300, 300).unwrap(), 1);
    }

    #[test]
    fn rejects_non_integer_ratios() {
        assert!(matches!(
            upsample_factor(60, 250),
            Err(SyncError::Configuration(_))
        ));
        assert!(matches!(
            upsample_factor(300, 60),
            Err(SyncError::Configuration(_))
        ));
        assert!(matches!(
            upsample_factor(0, 300),
            Err(SyncError::Configuration(_))
        ));
    }
}
