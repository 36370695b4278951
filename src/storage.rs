//! Random-access layer tables on disk.
//!
//! Two layers are open at any time: the working table being solved, read
//! and written record by record, and the finalized table of the layer
//! above it, consulted read-only for wall-placement successors. Tables are
//! plain arrays of fixed-width records, so they may grow past physical
//! memory; the operating system's page cache is the only buffering.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use byteorder::{NativeEndian, ReadBytesExt, WriteBytesExt};
use indicatif::{ProgressBar, ProgressStyle};

use crate::{BOARD_SIZE, NB_WALLS};

/// One working-table entry.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Record {
    /// Code of the successor position that justifies the stored move.
    pub next: u64,
    /// Plies to the end of the game; odd means the side to move wins, and
    /// 1 is the initial "unknown" sentinel.
    pub move_to_win: u16,
    /// Encoded best move, 0 while undecided.
    pub best_move: u16,
}

/// On-disk size of one working record: the three fields packed in order,
/// native byte order.
pub const RECORD_BYTES: u64 = 12;

impl Record {
    /// The state every table slot starts in.
    pub fn unknown() -> Self {
        Record {
            next: 0,
            move_to_win: 1,
            best_move: 0,
        }
    }

    pub(crate) fn read_from<R: Read>(reader: &mut R) -> std::io::Result<Self> {
        let next = reader.read_u64::<NativeEndian>()?;
        let move_to_win = reader.read_u16::<NativeEndian>()?;
        let best_move = reader.read_u16::<NativeEndian>()?;
        Ok(Record {
            next,
            move_to_win,
            best_move,
        })
    }

    pub(crate) fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_u64::<NativeEndian>(self.next)?;
        writer.write_u16::<NativeEndian>(self.move_to_win)?;
        writer.write_u16::<NativeEndian>(self.best_move)
    }
}

/// Which of the two open layers to read from.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Slot {
    Current,
    Previous,
}

/// The pair of open layer files and the directory they live in.
pub struct LayerStorage {
    dir: PathBuf,
    current: Option<File>,
    previous: Option<File>,
}

impl LayerStorage {
    /// Prepares `<root>/boardSize_<B>/nbWalls_<W>/` and returns a storage
    /// handle with no layers open yet.
    pub fn create(root: &Path) -> Result<Self> {
        let dir = root
            .join(format!("boardSize_{}", BOARD_SIZE))
            .join(format!("nbWalls_{}", NB_WALLS));
        fs::create_dir_all(&dir)
            .with_context(|| format!("could not create output directory {}", dir.display()))?;
        Ok(Self {
            dir,
            current: None,
            previous: None,
        })
    }

    /// The directory layer files are written to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Allocates the working file for a layer, every record unknown.
    pub fn init_layer(&mut self, layer: usize, size: u64) -> Result<()> {
        println!("Initializing memory for layer {}.", layer);

        let path = self.dir.join(format!("layer_{}_memory.temp", layer));
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .with_context(|| format!("could not create {}", path.display()))?;

        let progress = progress_bar(size);
        {
            let mut writer = BufWriter::new(&file);
            for _ in 0..size {
                Record::unknown().write_to(&mut writer)?;
                progress.inc(1);
            }
            writer.flush()?;
        }
        progress.finish_and_clear();

        self.current = Some(file);
        Ok(())
    }

    /// Reads the record at `index` from the chosen layer.
    pub fn read(&mut self, index: u64, slot: Slot) -> Result<Record> {
        let file = match slot {
            Slot::Current => self.current.as_mut(),
            Slot::Previous => self.previous.as_mut(),
        }
        .ok_or_else(|| anyhow!("no open layer file to read from"))?;

        file.seek(SeekFrom::Start(index * RECORD_BYTES))?;
        Ok(Record::read_from(file)?)
    }

    /// Writes the record at `index` in the working layer.
    pub fn write(&mut self, index: u64, record: Record) -> Result<()> {
        let file = self
            .current
            .as_mut()
            .ok_or_else(|| anyhow!("no working layer file"))?;
        file.seek(SeekFrom::Start(index * RECORD_BYTES))?;
        record.write_to(file)?;
        Ok(())
    }

    /// Rewrites the working layer as the shipped table: one `move` field
    /// per record, same indexing. The working file is left in place; it is
    /// still the placement target while the layer below is solved.
    pub fn compress(&mut self, layer: usize, size: u64) -> Result<()> {
        println!("Compressing memory for layer {}.", layer);

        let file = self
            .current
            .as_mut()
            .ok_or_else(|| anyhow!("no working layer file"))?;
        file.seek(SeekFrom::Start(0))?;

        let path = self.dir.join(format!("layer_{}.quoridor", layer));
        let out = File::create(&path)
            .with_context(|| format!("could not create {}", path.display()))?;

        let mut reader = BufReader::new(&*file);
        let mut writer = BufWriter::new(out);
        let progress = progress_bar(size);
        for _ in 0..size {
            let record = Record::read_from(&mut reader)?;
            writer.write_u16::<NativeEndian>(record.best_move)?;
            progress.inc(1);
        }
        writer.flush()?;
        progress.finish_and_clear();
        Ok(())
    }

    /// Promotes the working layer to previous; the old previous is closed.
    pub fn rotate(&mut self) {
        self.previous = self.current.take();
    }
}

fn progress_bar(len: u64) -> ProgressBar {
    let bar = ProgressBar::new(len);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("[{bar:40}] {pos}/{len}")
            .progress_chars("=> "),
    );
    bar
}
