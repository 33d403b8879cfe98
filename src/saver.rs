use std::fs;
use std::path::{Path, PathBuf};

use askama::Template;
use plotters::prelude::*;
use svg2pdf::usvg;

use crate::chart::Figure;
use crate::config::FigureConfig;
use crate::exec_utils::exec_shell;
use crate::prelude::*;
use crate::table::Table;

#[derive(Debug, Clone, PartialEq)]
pub struct SavedFigure {
    pub png: PathBuf,
    pub pdf: PathBuf,
}

struct HtmlRow {
    name: String,
    cells: Vec<String>,
}

#[derive(Template)]
#[template(
    source = r#"<table border="1" class="dataframe">
  <thead>
    <tr><th>{{ index_name }}</th>{% for column in columns %}<th>{{ column }}</th>{% endfor %}</tr>
  </thead>
  <tbody>
{% for row in rows %}    <tr><th>{{ row.name }}</th>{% for cell in row.cells %}<td>{{ cell }}</td>{% endfor %}</tr>
{% endfor %}  </tbody>
</table>
"#,
    ext = "html"
)]
struct TableTemplate<'a> {
    index_name: &'a str,
    columns: &'a [String],
    rows: Vec<HtmlRow>,
}

/// Writes figures and tables under `<save_loc>/<save_prefix>`.
#[derive(Debug, Clone)]
pub struct FigureSaver {
    config: FigureConfig,
}

impl FigureSaver {
    pub fn new(config: FigureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FigureConfig {
        &self.config
    }

    /// Returns the output directory, or `None` when it cannot be used. A
    /// path that exists but is not a directory only aborts this save.
    fn prepare_dir(&self) -> Result<Option<PathBuf>> {
        let dir = self.config.save_dir();
        if dir.exists() {
            if !dir.is_dir() {
                error!("{} : is not a directory, FATAL", dir.display());
                return Ok(None);
            }
        } else {
            fs::create_dir_all(&dir)?;
        }
        Ok(Some(dir))
    }

    /// Renders `figure` to `<name>.png` and `<name>.pdf`. With `crop` set and
    /// a crop command configured, the command is run over the PDF.
    pub fn save_fig<F: Figure>(
        &self,
        name: &str,
        figure: &F,
        crop: bool,
    ) -> Result<Option<SavedFigure>> {
        if self.config.disable_fig_save {
            debug!("Figure saving disabled, skipping {}", name);
            return Ok(None);
        }
        let Some(dir) = self.prepare_dir()? else {
            return Ok(None);
        };

        let png = dir.join(format!("{}.png", name));
        let pdf = dir.join(format!("{}.pdf", name));
        let size = self.config.pixel_size();

        {
            let root = BitMapBackend::new(&png, size).into_drawing_area();
            figure.draw(&root, &self.config)?;
            root.present().map_err(plot_err)?;
        }
        info!("Plot saved as {}", png.display());

        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
            figure.draw(&root, &self.config)?;
            root.present().map_err(plot_err)?;
        }
        fs::write(&pdf, svg_to_pdf(&svg)?)?;
        info!("Plot saved as {}", pdf.display());

        if crop {
            self.crop(&pdf)?;
        }

        Ok(Some(SavedFigure { png, pdf }))
    }

    fn crop(&self, path: &Path) -> Result<()> {
        let Some(template) = &self.config.crop_command else {
            debug!("No crop command configured, leaving {} as is", path.display());
            return Ok(());
        };
        let cmd = template.replace("{path}", &path.display().to_string());
        info!("Cropping {} with command `{}`", path.display(), cmd);
        exec_shell(&cmd)?;
        Ok(())
    }

    /// Writes an HTML rendition of `table` to `<name>.html`.
    pub fn save_table(&self, table: &Table, name: &str) -> Result<Option<PathBuf>> {
        if self.config.disable_fig_save {
            debug!("Figure saving disabled, skipping {}", name);
            return Ok(None);
        }
        let Some(dir) = self.prepare_dir()? else {
            return Ok(None);
        };

        let rows = table
            .index
            .iter()
            .zip(&table.values)
            .map(|(name, values)| HtmlRow {
                name: name.clone(),
                cells: values.iter().map(|v| v.to_string()).collect(),
            })
            .collect();
        let html = TableTemplate {
            index_name: &table.index_name,
            columns: &table.columns,
            rows,
        }
        .render()?;

        let dest = dir.join(format!("{}.html", name));
        fs::write(&dest, html)?;
        info!("Table saved as {}", dest.display());
        Ok(Some(dest))
    }
}

/// Converts a rendered SVG document into a single page PDF.
fn svg_to_pdf(svg: &str) -> Result<Vec<u8>> {
    let mut options = usvg::Options::default();
    options.fontdb_mut().load_system_fonts();
    let tree = usvg::Tree::from_str(svg, &options).map_err(pdf_err)?;
    svg2pdf::to_pdf(
        &tree,
        svg2pdf::ConversionOptions::default(),
        svg2pdf::PageOptions::default(),
    )
    .map_err(pdf_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use plotters::coord::Shift;
    use tempfile::TempDir;

    /// Fills the canvas; needs no fonts.
    struct Swatch;

    impl Figure for Swatch {
        fn draw<DB: DrawingBackend>(
            &self,
            root: &DrawingArea<DB, Shift>,
            _config: &FigureConfig,
        ) -> Result<()> {
            root.fill(&RED).map_err(plot_err)
        }
    }

    fn config(dir: &TempDir) -> FigureConfig {
        FigureConfig {
            save_loc: dir.path().to_path_buf(),
            save_prefix: "figs".to_string(),
            dpi: 10,
            ..FigureConfig::default()
        }
    }

    #[test]
    fn saves_png_and_pdf() {
        let dir = TempDir::new().unwrap();
        let saver = FigureSaver::new(config(&dir));

        let saved = saver.save_fig("swatch", &Swatch, true).unwrap().unwrap();
        assert_eq!(saved.png, dir.path().join("figs/swatch.png"));
        assert_eq!(saved.pdf, dir.path().join("figs/swatch.pdf"));
        assert!(fs::read(&saved.png).unwrap().starts_with(b"\x89PNG"));
        assert!(fs::read(&saved.pdf).unwrap().starts_with(b"%PDF"));
        assert!(!dir.path().join("figs/swatch.svg").exists());
    }

    #[test]
    fn converts_svg_documents_to_pdf() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="10"><rect width="20" height="10" fill="red"/></svg>"#;
        assert!(svg_to_pdf(svg).unwrap().starts_with(b"%PDF"));
        assert!(matches!(svg_to_pdf("not svg"), Err(Error::Pdf(_))));
    }

    #[test]
    fn disabled_saver_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let saver = FigureSaver::new(FigureConfig {
            disable_fig_save: true,
            ..config(&dir)
        });

        assert_eq!(saver.save_fig("swatch", &Swatch, false).unwrap(), None);
        assert!(!dir.path().join("figs").exists());
    }

    #[test]
    fn file_in_place_of_directory_aborts_only_that_save() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("figs"), "not a dir").unwrap();
        let saver = FigureSaver::new(config(&dir));
        assert_eq!(saver.save_fig("swatch", &Swatch, false).unwrap(), None);

        fs::remove_file(dir.path().join("figs")).unwrap();
        assert!(saver.save_fig("swatch", &Swatch, false).unwrap().is_some());
    }

    #[test]
    fn runs_crop_command_on_vector_output() {
        let dir = TempDir::new().unwrap();
        let saver = FigureSaver::new(FigureConfig {
            crop_command: Some("cp {path} {path}.cropped".to_string()),
            ..config(&dir)
        });

        let saved = saver.save_fig("swatch", &Swatch, true).unwrap().unwrap();
        assert!(dir.path().join("figs/swatch.pdf.cropped").is_file());

        // Without the crop flag the command does not run.
        fs::remove_file(dir.path().join("figs/swatch.pdf.cropped")).unwrap();
        saver.save_fig("swatch", &Swatch, false).unwrap();
        assert!(!PathBuf::from(format!("{}.cropped", saved.pdf.display())).exists());
    }

    #[test]
    fn failing_crop_command_is_surfaced() {
        let dir = TempDir::new().unwrap();
        let saver = FigureSaver::new(FigureConfig {
            crop_command: Some("false {path}".to_string()),
            ..config(&dir)
        });
        assert!(matches!(
            saver.save_fig("swatch", &Swatch, true),
            Err(Error::ExecError { .. })
        ));
    }

    #[test]
    fn saves_table_as_html() {
        let dir = TempDir::new().unwrap();
        let saver = FigureSaver::new(config(&dir));
        let mut table = Table::new("size", vec!["a<b".to_string()]);
        table.push_row("1M", vec![1.5]).unwrap();

        let dest = saver.save_table(&table, "results").unwrap().unwrap();
        let html = fs::read_to_string(dest).unwrap();
        assert!(html.contains("<th>size</th>"));
        assert!(html.contains("<th>a&lt;b</th>"));
        assert!(html.contains("<tr><th>1M</th><td>1.5</td></tr>"));
    }
}
