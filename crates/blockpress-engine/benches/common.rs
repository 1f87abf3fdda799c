// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
#[allow(dead_code)]
pub fn generate_post_html(sections: usize) -> String {
    let section = concat!(
        "<h2>Section</h2>\n",
        "<p>Paragraph with <strong>bold</strong>, <em>italic</em> and a <a href=\"/x\">link</a>.</p>\n",
        "<div data-type=\"code-block\" data-language=\"rust\"><pre><code>fn main() {}</code></pre></div>\n",
        "<div class=\"alert\" data-type=\"TIP\" data-content=\"Remember this.\"></div>\n",
        "<figure data-type=\"image\" data-align=\"left\"><img src=\"/a.png\" alt=\"A\" width=\"600\" height=\"400\"></figure>\n",
        "<div data-type=\"image-gallery\" data-columns=\"2\" data-images='[{\"id\":\"a\",\"src\":\"/a.jpg\"},{\"id\":\"b\",\"src\":\"/b.jpg\"}]'></div>\n",
    );
    section.repeat(sections)
}
