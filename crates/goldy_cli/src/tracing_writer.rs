use rustyline_async::SharedWriter;
use std::io::{self, Write};
use std::sync::Mutex;
use tracing_subscriber::fmt::MakeWriter;

/// Log writer that switches to the live console's SharedWriter once the console
/// owns the terminal, so log lines do not tear through the `> ` prompt
#[derive(Clone, Default)]
pub struct TracingWriter {
    writer: Option<SharedWriter>,
}

impl TracingWriter {
    pub fn set_shared_writer(&mut self, writer: SharedWriter) {
        self.writer = Some(writer);
    }
}

impl Write for TracingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.writer {
            Some(ref mut writer) => writer.write(buf),
            None => io::stderr().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.writer {
            Some(ref mut writer) => writer.flush(),
            None => io::stderr().flush(),
        }
    }
}

static TRACING_WRITER: Mutex<Option<TracingWriter>> = Mutex::new(None);

/// Install the global writer; logs go to stderr until a console attaches
pub fn init_tracing_writer() -> TracingWriter {
    let writer = TracingWriter::default();
    if let Ok(mut global) = TRACING_WRITER.lock() {
        *global = Some(writer.clone());
    }
    writer
}

/// Route all further log output through the console's SharedWriter
pub fn set_shared_writer(shared_writer: SharedWriter) {
    if let Ok(mut global) = TRACING_WRITER.lock() {
        if let Some(ref mut writer) = *global {
            writer.set_shared_writer(shared_writer);
        }
    }
}

fn current_writer() -> Option<TracingWriter> {
    TRACING_WRITER.lock().ok()?.clone()
}

impl<'a> MakeWriter<'a> for TracingWriter {
    type Writer = TracingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        current_writer().unwrap_or_else(|| self.clone())
    }
}
