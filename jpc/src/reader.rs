use log::{info, warn};
use std::io;
use std::sync::Arc;

use crate::cursor::RestorePosition;
use crate::dump::dump;
use crate::error::{CodestreamError, Result};
use crate::index::{build_with_options, BlockExtent, BlockIndex, CodestreamLayout, IndexOptions};
use crate::locate::{block_rect, locate, BlockRect};

/// How block byte ranges are found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockLayout {
    /// Scan the codestream for tile-parts.
    Indexed,
    /// Every block is `size` bytes, back to back from the data offset.
    Uniform { size: u64 },
}

#[derive(Debug, Clone)]
enum IndexState {
    NotBuilt,
    Built(Arc<BlockIndex>),
    // Failures are kept for the lifetime of the stream, never retried
    Invalid(String),
}

/// Block-wise access to one codestream.
///
/// Owns the stream for as long as it is in use so that index building, dumps
/// and block reads never interleave. The index is built on the first block
/// request and kept until the stream is replaced.
pub struct BlockReader<R> {
    reader: R,
    layout: CodestreamLayout,
    block_width: u32,
    block_height: u32,
    block_layout: BlockLayout,
    options: IndexOptions,
    state: IndexState,

    // Reused between reads, sized up front when all blocks share one size
    compressed: Vec<u8>,
}

impl<R: io::Read + io::Seek> BlockReader<R> {
    pub fn new(reader: R, layout: CodestreamLayout, block_width: u32, block_height: u32) -> Self {
        BlockReader {
            reader,
            layout,
            block_width,
            block_height,
            block_layout: BlockLayout::Indexed,
            options: IndexOptions::default(),
            state: IndexState::NotBuilt,
            compressed: vec![],
        }
    }

    pub fn with_options(mut self, options: IndexOptions) -> Self {
        self.options = options;
        self.invalidate();
        self
    }

    pub fn with_block_layout(mut self, block_layout: BlockLayout) -> Self {
        self.block_layout = block_layout;
        self.invalidate();
        self
    }

    pub fn layout(&self) -> &CodestreamLayout {
        &self.layout
    }

    pub fn block_size(&self) -> (u32, u32) {
        (self.block_width, self.block_height)
    }

    /// The built index, without building it.
    pub fn index(&self) -> Result<Arc<BlockIndex>> {
        match &self.state {
            IndexState::NotBuilt => Err(CodestreamError::IndexNotBuilt),
            IndexState::Built(index) => Ok(Arc::clone(index)),
            IndexState::Invalid(reason) => Err(CodestreamError::IndexInvalid {
                reason: reason.clone(),
            }),
        }
    }

    /// Builds the index unless that was already attempted.
    ///
    /// The first failure is returned as is, later calls report it as
    /// `IndexInvalid`.
    pub fn build_index(&mut self) -> Result<Arc<BlockIndex>> {
        if !matches!(self.state, IndexState::NotBuilt) {
            return self.index();
        }

        let result = match self.block_layout {
            BlockLayout::Uniform { size } => Ok(BlockIndex::uniform(
                self.layout.data_offset,
                size,
                self.layout.rows,
                self.layout.columns,
            )),
            BlockLayout::Indexed => build_with_options(&mut self.reader, &self.layout, &self.options),
        };

        match result {
            Ok(index) => {
                let index = Arc::new(index);
                if let Some(size) = index.uniform_size() {
                    info!("all {} blocks are {} bytes", index.len(), size);
                    self.compressed = Vec::with_capacity(size as usize);
                } else {
                    self.compressed.clear();
                }
                self.state = IndexState::Built(Arc::clone(&index));
                Ok(index)
            }
            Err(error) => {
                warn!("block-wise access unavailable: {}", error);
                self.state = IndexState::Invalid(error.to_string());
                Err(error)
            }
        }
    }

    /// Locates a pixel in an index built earlier.
    pub fn locate(&self, x: i64, y: i64) -> Result<BlockExtent> {
        let index = self.index()?;
        locate(&index, self.block_width, self.block_height, x, y)
    }

    /// Locates a pixel, building the index first if needed.
    pub fn block_extent(&mut self, x: i64, y: i64) -> Result<BlockExtent> {
        let index = self.build_index()?;
        locate(&index, self.block_width, self.block_height, x, y)
    }

    /// Pixel rectangle of the block holding `x`, `y`.
    pub fn block_rect(&mut self, x: i64, y: i64) -> Result<BlockRect> {
        let extent = self.block_extent(x, y)?;
        Ok(block_rect(
            self.block_width,
            self.block_height,
            extent.row,
            extent.column,
        ))
    }

    /// Reads the compressed bytes of the block holding `x`, `y`.
    ///
    /// The stream position is left as it was.
    pub fn read_block(&mut self, x: i64, y: i64) -> Result<&[u8]> {
        let extent = self.block_extent(x, y)?;
        let length = usize::try_from(extent.length).map_err(|_| CodestreamError::IndexInvalid {
            reason: format!("block length {} does not fit in memory", extent.length),
        })?;

        self.compressed.resize(length, 0);
        let mut reader = RestorePosition::new(&mut self.reader)?;
        reader.seek(io::SeekFrom::Start(extent.offset))?;
        reader
            .read_exact(&mut self.compressed)
            .map_err(|e| CodestreamError::from_read(e, extent.offset))?;
        drop(reader);

        Ok(&self.compressed)
    }

    /// Writes the diagnostic walk of this codestream to `sink`.
    pub fn dump<W: io::Write>(&mut self, sink: &mut W) -> Result<()> {
        dump(
            &mut self.reader,
            self.layout.data_offset,
            self.layout.rows,
            self.layout.columns,
            sink,
        )
    }

    /// Swaps in a new stream, dropping whatever index the old one had.
    pub fn replace_stream(&mut self, reader: R) -> R {
        self.invalidate();
        std::mem::replace(&mut self.reader, reader)
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    fn invalidate(&mut self) {
        self.state = IndexState::NotBuilt;
        self.compressed.clear();
    }
}
