//! srcsrv stream serializer.
//!
//! The stream is consumed by the stream-injection tool and, later, by the
//! debugger's source server. Layout and section markers must match exactly.

use url::Url;

use pdblink_shared::DownloadMethod;

use crate::context::LinkContext;

/// Line terminator expected by the Windows tooling.
pub const LINE_END: &str = "\r\n";

const INI_HEADER: &str = "SRCSRV: ini ------------------------------------------------";
const VARIABLES_HEADER: &str = "SRCSRV: variables ------------------------------------------";
const SOURCE_FILES_HEADER: &str = "SRCSRV: source files ---------------------------------------";
const END_MARKER: &str = "SRCSRV: end ------------------------------------------------";

/// Render the index for `context`.
///
/// Uses the structured form when the context carries extra metadata,
/// otherwise the generic raw-URL form.
pub fn serialize(context: &LinkContext) -> Vec<u8> {
    let mut out = StreamBuilder::default();

    out.line(INI_HEADER);
    out.line("VERSION=2");
    out.line(VARIABLES_HEADER);

    if context.extra_metadata.is_empty() {
        write_generic_variables(&mut out, context);
    } else {
        write_structured_variables(&mut out, context);
    }

    out.line(SOURCE_FILES_HEADER);
    for (build_path, repo_path) in context.indexed() {
        out.line(&format!("{build_path}*{}", repo_path.replace('\\', "/")));
    }
    out.line(END_MARKER);

    out.into_bytes()
}

fn write_generic_variables(out: &mut StreamBuilder, context: &LinkContext) {
    let raw_url = context.raw_url();
    out.line(&format!("RAWURL={raw_url}"));

    match context.download_method {
        DownloadMethod::Http => {
            out.line(&format!("SRCSRVVERCTRL={}", url_scheme(&raw_url)));
            out.line("SRCSRVTRG=%RAWURL%");
        }
        DownloadMethod::Powershell => {
            out.line(r"TRGFILE=%targ%\%fnbksl%(%var2%)");
            out.line("SRCSRVTRG=%TRGFILE%");
            out.line(
                "SRCSRVCMD=powershell -NoProfile -Command \
                 \"(New-Object System.Net.WebClient).DownloadFile('%RAWURL%', '%TRGFILE%')\"",
            );
        }
    }
}

fn write_structured_variables(out: &mut StreamBuilder, context: &LinkContext) {
    for (key, value) in &context.extra_metadata {
        out.line(&format!("{key}={value}"));
    }
    out.line(r"TFS_EXTRACT_TARGET=%targ%\%TFS_COMMIT%\%fnbksl%(%var2%)");
    out.line(
        "TFS_EXTRACT_CMD=tf.exe git view /collection:%TFS_COLLECTION% \
         /teamproject:\"%TFS_TEAM_PROJECT%\" /repository:\"%TFS_REPO%\" \
         /commitId:%TFS_COMMIT% /path:\"%var2%\" /output:%SRCSRVTRG% /applyfilters",
    );
    out.line("SRCSRVVERCTRL=git");
    out.line("SRCSRVERRDESC=access");
    out.line("SRCSRVERRVAR=var2");
    out.line("SRCSRVTRG=%TFS_EXTRACT_TARGET%");
    out.line("SRCSRVCMD=%TFS_EXTRACT_CMD%");
}

/// Scheme of the raw URL; `https` when the template does not parse as a URL.
fn url_scheme(raw_url: &str) -> String {
    Url::parse(raw_url)
        .map(|u| u.scheme().to_string())
        .unwrap_or_else(|_| "https".to_string())
}

#[derive(Default)]
struct StreamBuilder {
    buf: String,
}

impl StreamBuilder {
    fn line(&mut self, text: &str) {
        self.buf.push_str(text);
        self.buf.push_str(LINE_END);
    }

    fn into_bytes(self) -> Vec<u8> {
        self.buf.into_bytes()
    }
}
