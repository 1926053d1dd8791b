/// Pitch layout - maps grid cells to equal-tempered frequencies
/// Row order is flipped so the lowest semitones sit on the bottom row
use crate::error::{Error, Result};
use crate::midi::{frequency_to_midi_note, midi_note_name};

pub const DEFAULT_COLS: usize = 13;
pub const DEFAULT_ROWS: usize = 6;
pub const REFERENCE_FREQUENCY: f64 = 440.0;
pub const REFERENCE_SEMITONE_OFFSET: i32 = 50;

/// Dimensions and tuning of the pad grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridConfig {
    pub num_cols: usize,
    pub num_rows: usize,
    pub reference_frequency: f64,
    pub reference_semitone_offset: i32,
    /// Amplitude a pressed pad plays at
    pub amplitude: f64,
}

impl GridConfig {
    pub fn new(num_cols: usize, num_rows: usize) -> Self {
        Self {
            num_cols,
            num_rows,
            ..Self::default()
        }
    }

    pub fn num_cells(&self) -> usize {
        self.num_cols.saturating_mul(self.num_rows)
    }

    /// Dimensions must be non-zero, the reference a positive finite Hz value
    /// and the amplitude within 0..=1
    pub fn validate(&self) -> Result<()> {
        check_range(0, self.num_cols, self.num_rows)?;
        check_reference(self.reference_frequency)?;
        if !(0.0..=1.0).contains(&self.amplitude) {
            return Err(Error::InvalidConfig(format!(
                "amplitude {} is outside 0..=1",
                self.amplitude
            )));
        }
        Ok(())
    }

    pub fn contains(&self, index: usize) -> bool {
        index < self.num_cells()
    }

    pub fn cell(&self, index: usize) -> Result<Cell> {
        check_range(index, self.num_cols, self.num_rows)?;
        Ok(Cell {
            index,
            row: index / self.num_cols,
            col: index % self.num_cols,
        })
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            num_cols: DEFAULT_COLS,
            num_rows: DEFAULT_ROWS,
            reference_frequency: REFERENCE_FREQUENCY,
            reference_semitone_offset: REFERENCE_SEMITONE_OFFSET,
            amplitude: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub index: usize,
    pub row: usize,
    pub col: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    pub index: usize,
    pub frequency: f64,
}

/// Frequency of the cell at `index` with the default 440 Hz / offset 50 tuning
pub fn frequency(index: usize, num_cols: usize, num_rows: usize) -> Result<f64> {
    frequency_with(
        index,
        num_cols,
        num_rows,
        REFERENCE_FREQUENCY,
        REFERENCE_SEMITONE_OFFSET,
    )
}

pub fn frequency_with(
    index: usize,
    num_cols: usize,
    num_rows: usize,
    reference_frequency: f64,
    reference_semitone_offset: i32,
) -> Result<f64> {
    check_range(index, num_cols, num_rows)?;
    check_reference(reference_frequency)?;

    // Visual row r holds the semitone block numbered (rows - 1 - r)
    let quotient = num_rows - 1 - index / num_cols;
    let remainder = index % num_cols;
    let semitone = quotient * num_cols + remainder;

    Ok(semitone_frequency(
        semitone,
        reference_frequency,
        reference_semitone_offset,
    ))
}

/// Equal-tempered frequency of raw semitone `n`, before any row remap
pub fn semitone_frequency(n: usize, reference_frequency: f64, reference_semitone_offset: i32) -> f64 {
    let distance = n as f64 - reference_semitone_offset as f64;
    reference_frequency * 2.0_f64.powf(distance / 12.0)
}

fn check_reference(reference_frequency: f64) -> Result<()> {
    if reference_frequency.is_finite() && reference_frequency > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!(
            "reference frequency {} Hz is not positive",
            reference_frequency
        )))
    }
}

fn check_range(index: usize, num_cols: usize, num_rows: usize) -> Result<()> {
    let in_range = num_cols > 0
        && num_rows > 0
        && num_cols
            .checked_mul(num_rows)
            .is_some_and(|total| index < total);

    if in_range {
        Ok(())
    } else {
        Err(Error::OutOfRange {
            index,
            num_cols,
            num_rows,
        })
    }
}

/// Precomputed notes for one grid configuration, in visual order
#[derive(Debug, Clone)]
pub struct PitchGrid {
    config: GridConfig,
    notes: Vec<Note>,
}

impl PitchGrid {
    pub fn new(config: GridConfig) -> Result<Self> {
        config.validate()?;

        let num_notes = config.num_cells();
        let mut frequencies = vec![0.0; num_notes];

        for n in 0..num_notes {
            let quotient = n / config.num_cols;
            let remainder = n % config.num_cols;
            let target = num_notes - (quotient + 1) * config.num_cols + remainder;
            frequencies[target] = semitone_frequency(
                n,
                config.reference_frequency,
                config.reference_semitone_offset,
            );
        }

        let notes = frequencies
            .into_iter()
            .enumerate()
            .map(|(index, frequency)| Note { index, frequency })
            .collect();

        Ok(Self { config, notes })
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn frequency(&self, index: usize) -> Result<f64> {
        self.notes
            .get(index)
            .map(|note| note.frequency)
            .ok_or(Error::OutOfRange {
                index,
                num_cols: self.config.num_cols,
                num_rows: self.config.num_rows,
            })
    }

    pub fn cell(&self, index: usize) -> Result<Cell> {
        self.config.cell(index)
    }

    /// Nearest MIDI note name, e.g. "A4"
    pub fn note_name(&self, index: usize) -> Result<String> {
        let frequency = self.frequency(index)?;
        Ok(midi_note_name(frequency_to_midi_note(frequency)))
    }
}

impl Default for PitchGrid {
    fn default() -> Self {
        let config = GridConfig::default();
        // The default dimensions are non-zero, so the sweep always succeeds
        Self::new(config).unwrap_or(Self {
            config,
            notes: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_note_lands_on_row_two() {
        // Raw semitone 50 is quotient 3, remainder 11 -> visual index 2 * 13 + 11
        let hz = frequency(37, 13, 6).unwrap();
        assert_eq!(hz, 440.0);

        let cell = GridConfig::default().cell(37).unwrap();
        assert_eq!((cell.row, cell.col), (2, 11));
    }

    #[test]
    fn test_bottom_left_is_lowest() {
        let grid = PitchGrid::default();
        let lowest = semitone_frequency(0, 440.0, 50);
        assert_eq!(grid.frequency(65).unwrap(), lowest);

        let min = grid
            .notes()
            .iter()
            .map(|n| n.frequency)
            .fold(f64::INFINITY, f64::min);
        assert_eq!(min, lowest);
    }

    #[test]
    fn test_top_right_is_highest() {
        let grid = PitchGrid::default();
        let highest = semitone_frequency(77, 440.0, 50);
        assert_eq!(grid.frequency(12).unwrap(), highest);
    }

    #[test]
    fn test_deterministic() {
        for index in 0..78 {
            let a = frequency(index, 13, 6).unwrap();
            let b = frequency(index, 13, 6).unwrap();
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn test_sweep_matches_analytic() {
        for (cols, rows) in [(13, 6), (1, 1), (4, 3), (7, 1), (1, 9)] {
            let grid = PitchGrid::new(GridConfig::new(cols, rows)).unwrap();
            assert_eq!(grid.len(), cols * rows);
            for note in grid.notes() {
                let hz = frequency(note.index, cols, rows).unwrap();
                assert_eq!(hz.to_bits(), note.frequency.to_bits());
            }
        }
    }

    #[test]
    fn test_rows_rise_upwards() {
        let (cols, rows) = (13, 6);
        for row in 0..rows {
            for col in 1..cols {
                let left = frequency(row * cols + col - 1, cols, rows).unwrap();
                let right = frequency(row * cols + col, cols, rows).unwrap();
                assert!(right > left);
            }
        }
        for row in 1..rows {
            // Last pad of a lower row is still below the first pad of the row above
            let below_end = frequency(row * cols + cols - 1, cols, rows).unwrap();
            let above_start = frequency((row - 1) * cols, cols, rows).unwrap();
            assert!(above_start > below_end);
        }
    }

    #[test]
    fn test_out_of_range() {
        assert_eq!(
            frequency(78, 13, 6),
            Err(Error::OutOfRange {
                index: 78,
                num_cols: 13,
                num_rows: 6
            })
        );
        assert!(frequency(0, 0, 6).is_err());
        assert!(frequency(0, 13, 0).is_err());
        assert!(PitchGrid::new(GridConfig::new(0, 4)).is_err());
        assert!(PitchGrid::default().frequency(78).is_err());
    }

    #[test]
    fn test_custom_reference() {
        // One row, offset 0: index 0 is the reference itself, index 12 an octave up
        let hz = frequency_with(0, 13, 1, 261.5, 0).unwrap();
        assert_eq!(hz, 261.5);
        let octave = frequency_with(12, 13, 1, 261.5, 0).unwrap();
        assert!((octave - 523.0).abs() < 1e-9);
    }

    #[test]
    fn test_note_name() {
        let grid = PitchGrid::default();
        assert_eq!(grid.note_name(37).unwrap(), "A4");
        // Semitone 0 is 50 below A4 (MIDI 69) -> MIDI 19
        assert_eq!(grid.note_name(65).unwrap(), "G0");
    }

    #[test]
    fn test_rejects_bad_reference() {
        for reference in [0.0, -440.0, f64::NAN, f64::INFINITY] {
            let config = GridConfig {
                reference_frequency: reference,
                ..GridConfig::default()
            };
            assert!(matches!(
                PitchGrid::new(config),
                Err(Error::InvalidConfig(_))
            ));
            assert!(matches!(
                frequency_with(0, 13, 6, reference, 50),
                Err(Error::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_rejects_bad_amplitude() {
        for amplitude in [-0.1, 1.5, f64::NAN] {
            let config = GridConfig {
                amplitude,
                ..GridConfig::default()
            };
            assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
            assert!(PitchGrid::new(config).is_err());
        }
        assert!(GridConfig::default().validate().is_ok());
    }

    #[test]
    fn test_every_pitch_positive() {
        let grid = PitchGrid::new(GridConfig {
            reference_frequency: 27.5,
            reference_semitone_offset: 200,
            ..GridConfig::new(13, 6)
        })
        .unwrap();
        assert!(grid.notes().iter().all(|n| n.frequency > 0.0 && n.frequency.is_finite()));
    }
}
